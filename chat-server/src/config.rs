//! CLI parsing and authfile resolution.

use clap::Parser;

use crate::error::ChatError;

/// `server authfile [port]`
#[derive(Debug, Parser)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct ServerArgs {
    pub authfile: String,
    pub port: Option<u16>,
}

impl ServerArgs {
    /// Parses argv, mapping any failure to the literal usage message rather
    /// than clap's generated usage text.
    pub fn parse_or_usage() -> Result<Self, ChatError> {
        Self::try_parse().map_err(|_| ChatError::Usage)
    }
}

/// Resolves the server's shared secret from an authfile, mapping any read
/// failure to the usage error (bad argc or unreadable authfile share one
/// exit code per the CLI contract).
pub fn resolve_secret(path: &str) -> Result<String, ChatError> {
    chat_protocol::authfile::resolve_secret(path).map_err(|_| ChatError::Usage)
}
