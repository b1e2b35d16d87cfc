//! Client handshake: authentication, then name negotiation.
//!
//! State machine is `AUTH_WAIT -> NAME_WAIT -> ACTIVE -> CLOSED`.
//! Any stream-end event in the first two states leads straight to `CLOSED`
//! without a roster insertion — callers see that as `Ok(None)`.
//!
//! Every record the server sends, handshake or not, goes out through the
//! connection's outbox channel rather than the raw socket directly, so the
//! same per-connection writer task is the only thing that ever touches the
//! write half.

use std::sync::Arc;

use chat_protocol::{record::tag, Record};
use tokio::io::AsyncBufRead;
use tokio::sync::{mpsc, Notify};

use crate::roster::Roster;

/// Result of a completed handshake: the negotiated name and the `Notify`
/// the session loop should race against its reads (for kicks).
pub struct Handshaked {
    pub name: String,
    pub disconnect: Arc<Notify>,
}

async fn send(tx: &mpsc::Sender<String>, record: Record) -> bool {
    let mut line = record.to_line();
    line.push('\n');
    tx.send(line).await.is_ok()
}

/// Drives AUTH then NAME negotiation. Returns `None` if the peer disconnects,
/// fails authentication, or the outbox closes before completing.
pub async fn run<R>(
    reader: &mut R,
    tx: &mpsc::Sender<String>,
    secret: &str,
    roster: &Roster,
    session_id: &str,
) -> std::io::Result<Option<Handshaked>>
where
    R: AsyncBufRead + Unpin,
{
    if !authenticate(reader, tx, secret, roster, session_id).await? {
        return Ok(None);
    }
    if !send(tx, Record::new(tag::OK, "")).await {
        return Ok(None);
    }

    let Some((name, disconnect)) = negotiate_name(reader, tx, roster, session_id).await? else {
        return Ok(None);
    };

    if !send(tx, Record::new(tag::OK, "")).await {
        roster.remove(&name);
        return Ok(None);
    }
    println!("({name} has entered the chat)");
    roster.broadcast(&Record::new(tag::ENTER, &name));
    tracing::info!(%session_id, %name, "client entered");

    Ok(Some(Handshaked { name, disconnect }))
}

async fn authenticate<R>(
    reader: &mut R,
    tx: &mpsc::Sender<String>,
    secret: &str,
    roster: &Roster,
    session_id: &str,
) -> std::io::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    if !send(tx, Record::new(tag::AUTH, "")).await {
        return Ok(false);
    }

    let mut buf = String::new();
    let Some(record) = chat_protocol::read_record(reader, &mut buf).await? else {
        tracing::debug!(%session_id, "disconnected during auth");
        return Ok(false);
    };
    if record.tag == tag::AUTH {
        roster.record_auth();
    }

    let ok = secret == chat_protocol::NOAUTH || record.payload == secret;
    if !ok {
        tracing::debug!(%session_id, "auth mismatch");
    }
    Ok(ok)
}

/// Loops WHO/NAME until a non-empty, unique name arrives, inserting it into
/// the roster atomically with the uniqueness check (avoiding a check-then-
/// insert race against a concurrent handshake choosing the same name).
/// Empty names are treated identically to collisions.
async fn negotiate_name<R>(
    reader: &mut R,
    tx: &mpsc::Sender<String>,
    roster: &Roster,
    session_id: &str,
) -> std::io::Result<Option<(String, Arc<Notify>)>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        if !send(tx, Record::new(tag::WHO, "")).await {
            return Ok(None);
        }

        let mut buf = String::new();
        let Some(record) = chat_protocol::read_record(reader, &mut buf).await? else {
            tracing::debug!(%session_id, "disconnected during name negotiation");
            return Ok(None);
        };
        if record.tag == tag::NAME {
            roster.record_name();
        }

        let candidate = record.payload;
        if candidate.is_empty() {
            if !send(tx, Record::new(tag::NAME_TAKEN, "")).await {
                return Ok(None);
            }
            continue;
        }

        match roster.insert_if_absent(&candidate, tx.clone()) {
            Some(disconnect) => return Ok(Some((candidate, disconnect))),
            None => {
                if !send(tx, Record::new(tag::NAME_TAKEN, "")).await {
                    return Ok(None);
                }
            }
        }
    }
}
