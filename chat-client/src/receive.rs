//! Client receive task: interprets server records, drives naming
//! negotiation, and renders every user-visible line the protocol defines.

use std::sync::Arc;

use chat_protocol::{record::tag, Record};
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;

use crate::error::ChatError;
use crate::naming::NamingState;
use crate::negotiated::Negotiated;

async fn send(tx: &mpsc::Sender<String>, record: Record) -> std::io::Result<()> {
    let mut line = record.to_line();
    line.push('\n');
    tx.send(line)
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "outbox closed"))
}

fn comms_error() -> ChatError {
    ChatError::Communications(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "server closed the connection",
    ))
}

/// Runs until a fatal condition is reached (kick, disconnect, or write
/// failure) and returns the exit reason. Never returns `Ok`.
pub async fn run<R>(
    mut reader: R,
    tx: mpsc::Sender<String>,
    naming: Arc<NamingState>,
    negotiated: Arc<Negotiated>,
    secret: &str,
) -> ChatError
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = String::new();

    loop {
        let record = match chat_protocol::read_record(&mut reader, &mut buf).await {
            Ok(Some(record)) => record,
            Ok(None) => return comms_error(),
            Err(err) => return ChatError::Communications(err),
        };

        match record.tag.as_str() {
            tag::AUTH => {
                if send(&tx, Record::new(tag::AUTH, secret)).await.is_err() {
                    return comms_error();
                }
                // The server's acknowledgment of a successful auth round is
                // consumed here as a bare liveness check, not dispatched:
                // a closed stream at this point means the secret was rejected.
                match chat_protocol::read_record(&mut reader, &mut buf).await {
                    Ok(Some(_)) => {}
                    Ok(None) => return ChatError::Authentication,
                    Err(_) => return ChatError::Authentication,
                }
            }
            tag::OK => negotiated.mark_ready(),
            tag::WHO => {
                let name = naming.current_name();
                if send(&tx, Record::new(tag::NAME, name)).await.is_err() {
                    return comms_error();
                }
            }
            tag::NAME_TAKEN => naming.record_collision(),
            tag::ENTER => println!("({} has entered the chat)", record.payload),
            tag::LEAVE => println!("({} has left the chat)", record.payload),
            tag::LIST => println!("(current chatters: {})", record.payload),
            tag::MSG => {
                let (name, text) = record.payload.split_once(':').unwrap_or((&record.payload, ""));
                println!("{name}: {text}");
            }
            tag::KICK => return ChatError::Kicked,
            _ => tracing::debug!(tag = %record.tag, "ignoring unrecognized tag"),
        }
    }
}
