//! Per-connection entry point: spawns the writer task, drives the handshake,
//! then hands off to the session loop.

use std::sync::Arc;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::roster::Roster;

/// Outbox channel depth. Generous relative to the 100ms say pacing — a
/// bursty peer backs up before it ever fills this.
const OUTBOX_CAPACITY: usize = 256;

pub async fn handle(stream: TcpStream, roster: Arc<Roster>, secret: Arc<str>) {
    let session_id = match stream.peer_addr() {
        Ok(addr) => addr.to_string(),
        Err(_) => "unknown".to_string(),
    };
    tracing::info!(%session_id, "accepted connection");

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOX_CAPACITY);

    let writer_session_id = session_id.clone();
    let writer_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if let Err(err) = write_half.write_all(line.as_bytes()).await {
                tracing::warn!(session_id = %writer_session_id, "write error: {err}");
                break;
            }
            if let Err(err) = write_half.flush().await {
                tracing::warn!(session_id = %writer_session_id, "flush error: {err}");
                break;
            }
        }
    });

    let handshaked = match crate::handshake::run(&mut reader, &tx, &secret, &roster, &session_id).await {
        Ok(Some(h)) => h,
        Ok(None) => {
            drop(tx);
            let _ = writer_task.await;
            tracing::info!(%session_id, "session ended before handshake completed");
            return;
        }
        Err(err) => {
            tracing::warn!(%session_id, "handshake I/O error: {err}");
            drop(tx);
            let _ = writer_task.await;
            return;
        }
    };

    crate::session::run(reader, roster, handshaked.name, handshaked.disconnect, &session_id).await;

    drop(tx);
    let _ = writer_task.await;
}
