//! Shared secret resolution, used by both the server and the client.

/// Sentinel meaning "no real secret configured"; the server treats it as
/// accept-any, and it's also what an empty authfile resolves to on either side.
pub const NOAUTH: &str = "noauth";

/// Resolves a shared secret from an authfile: the value is the **last
/// non-empty line**; a file with no non-empty line resolves to [`NOAUTH`].
pub fn resolve_secret(path: &str) -> std::io::Result<String> {
    let contents = std::fs::read_to_string(path)?;
    let secret = contents
        .lines()
        .filter(|line| !line.is_empty())
        .next_back()
        .map(str::to_string)
        .unwrap_or_else(|| NOAUTH.to_string());
    Ok(secret)
}
