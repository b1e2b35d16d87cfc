//! Wire grammar and line framing for the relay chat protocol.
//!
//! This crate is the single source of truth for how a record looks on the
//! wire, shared by the server and the client so neither can drift from the
//! other. See `record` for the grammar and `framing` for the newline-delimited
//! I/O that carries it.

pub mod authfile;
pub mod framing;
pub mod record;

pub use authfile::NOAUTH;
pub use framing::{read_record, write_record};
pub use record::Record;

/// Replaces any byte with code point < 32 with `?`.
///
/// Used to render display names and say payloads safely; the raw bytes are
/// still used for identity comparison (see [`record`] docs and the roster).
pub fn scrub_non_printable(s: &str) -> String {
    s.chars()
        .map(|c| if (c as u32) < 32 { '?' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrub_replaces_control_bytes() {
        assert_eq!(scrub_non_printable("hi\x01there"), "hi?there");
        assert_eq!(scrub_non_printable("clean"), "clean");
    }
}
