//! The colon-delimited command grammar.
//!
//! A record is `TAG` optionally followed by `:` and a payload. Only the
//! *first* colon is a delimiter; anything after it belongs to the payload
//! (`MSG:name:text` has tag `MSG` and payload `name:text`). A line with no
//! colon at all is treated as a tag with an empty payload rather than a
//! parse failure — the protocol has no fatal parse errors, only tags that
//! fail to match any known command.

/// Known tags. Unknown tags parse fine; they just won't match any of these
/// when a session dispatches on `record.tag`.
pub mod tag {
    pub const AUTH: &str = "AUTH";
    pub const OK: &str = "OK";
    pub const WHO: &str = "WHO";
    pub const NAME: &str = "NAME";
    pub const NAME_TAKEN: &str = "NAME_TAKEN";
    pub const ENTER: &str = "ENTER";
    pub const LEAVE: &str = "LEAVE";
    pub const MSG: &str = "MSG";
    pub const SAY: &str = "SAY";
    pub const KICK: &str = "KICK";
    pub const LIST: &str = "LIST";
}

/// A single newline-terminated protocol line, split into tag and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub tag: String,
    pub payload: String,
}

impl Record {
    pub fn new(tag: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            payload: payload.into(),
        }
    }

    /// Splits on the first colon only. No colon means an empty payload, not
    /// an error — mirrors the original's `strtok_r` behaviour on a missing
    /// delimiter.
    pub fn parse(line: &str) -> Self {
        match line.split_once(':') {
            Some((tag, payload)) => Record::new(tag, payload),
            None => Record::new(line, ""),
        }
    }

    /// Serializes back to `TAG:payload` (no trailing newline; framing adds that).
    pub fn to_line(&self) -> String {
        format!("{}:{}", self.tag, self.payload)
    }
}
