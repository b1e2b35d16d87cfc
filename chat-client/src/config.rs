//! CLI parsing and authfile resolution.

use clap::Parser;

use crate::error::ChatError;

/// `client name authfile port`
#[derive(Debug, Parser)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct ClientArgs {
    pub name: String,
    pub authfile: String,
    pub port: u16,
}

impl ClientArgs {
    /// Parses argv, mapping any failure to the literal usage message rather
    /// than clap's generated usage text.
    pub fn parse_or_usage() -> Result<Self, ChatError> {
        Self::try_parse().map_err(|_| ChatError::Usage)
    }
}

/// Resolves the client's shared secret from an authfile, mapping any read
/// failure to the usage error (bad argc or unreadable authfile share one
/// exit code per the CLI contract).
pub fn resolve_secret(path: &str) -> Result<String, ChatError> {
    chat_protocol::authfile::resolve_secret(path).map_err(|_| ChatError::Usage)
}
