//! Gate that releases the send task once the handshake has fully completed.

use tokio::sync::Notify;

/// The authentication round's own confirmation read is handled inline by
/// the receive task and never reaches the dispatch loop, so the one `OK:`
/// the loop ever sees is the one ending name negotiation.
#[derive(Default)]
pub struct Negotiated {
    ready: Notify,
}

impl Negotiated {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the receive task on the post-handshake `OK:`.
    pub fn mark_ready(&self) {
        self.ready.notify_one();
    }

    /// Resolves once the handshake has fully completed.
    pub async fn wait(&self) {
        self.ready.notified().await;
    }
}
