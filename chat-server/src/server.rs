//! Listener & acceptor: binds, announces the chosen port, and spawns an
//! independent session per accepted connection.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::error::ChatError;
use crate::roster::Roster;

/// Binds to `port` (0 for ephemeral), prints the chosen port to stderr as a
/// decimal integer followed by a newline, then accepts forever.
/// Never returns except on a bind failure.
pub async fn run(port: u16, secret: String, roster: Arc<Roster>) -> Result<(), ChatError> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let bound_port = listener.local_addr()?.port();
    eprintln!("{bound_port}");
    tracing::info!(port = bound_port, "listening");

    let secret: Arc<str> = Arc::from(secret);

    loop {
        let (stream, _addr) = listener.accept().await?;
        let roster = roster.clone();
        let secret = secret.clone();
        tokio::spawn(async move {
            crate::connection::handle(stream, roster, secret).await;
        });
    }
}
