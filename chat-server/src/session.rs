//! Client session: the post-handshake command loop.
//!
//! Owns teardown on disconnect, voluntary leave, or kick. A session never
//! writes to its own socket directly — every outgoing record, including
//! replies to itself (`LIST:`), goes through the roster's per-client outbox
//! so the single writer task per connection stays the only thing touching
//! the socket's write half.

use std::sync::Arc;
use std::time::Duration;

use chat_protocol::{record::tag, Record};
use tokio::io::AsyncBufRead;
use tokio::sync::Notify;

use crate::roster::Roster;

/// Pacing delay enforced after each processed `SAY`.
const SAY_PACING: Duration = Duration::from_millis(100);

pub async fn run<R>(
    mut reader: R,
    roster: Arc<Roster>,
    name: String,
    disconnect: Arc<Notify>,
    session_id: &str,
) where
    R: AsyncBufRead + Unpin,
{
    let mut buf = String::new();
    let mut already_removed = false;

    loop {
        tokio::select! {
            _ = disconnect.notified() => {
                tracing::info!(%session_id, %name, "session closed: kicked by another session");
                already_removed = true;
                break;
            }
            result = chat_protocol::read_record(&mut reader, &mut buf) => {
                let record = match result {
                    Ok(Some(record)) => record,
                    Ok(None) => break,
                    Err(err) => {
                        tracing::warn!(%session_id, %name, "read error: {err}");
                        break;
                    }
                };

                match record.tag.as_str() {
                    tag::SAY => handle_say(&roster, &name, record.payload).await,
                    tag::LIST => handle_list(&roster, &name),
                    tag::KICK => {
                        if handle_kick(&roster, &name, record.payload) {
                            already_removed = true;
                            break;
                        }
                    }
                    tag::LEAVE => {
                        handle_leave(&roster, &name);
                        already_removed = true;
                        break;
                    }
                    _ => tracing::debug!(%session_id, tag = %record.tag, "ignoring unrecognized tag"),
                }
            }
        }
    }

    // End-of-stream with the session still in the roster: same cleanup as a
    // voluntary LEAVE, but without incrementing the leave counter.
    if !already_removed && roster.contains(&name) {
        println!("({name} has left the chat)");
        roster.remove(&name);
        roster.broadcast(&Record::new(tag::LEAVE, &name));
    }
}

async fn handle_say(roster: &Roster, name: &str, text: String) {
    let display_name = chat_protocol::scrub_non_printable(name);
    let display_text = chat_protocol::scrub_non_printable(&text);
    println!("{display_name}: {display_text}");
    roster.say(name, &display_name, &display_text, SAY_PACING).await;
}

fn handle_list(roster: &Roster, name: &str) {
    roster.record_list(name);
    let csv = roster.snapshot_names().join(",");
    roster.send_to(name, &Record::new(tag::LIST, csv));
}

/// Returns `true` if the caller just kicked itself and should exit its loop.
fn handle_kick(roster: &Roster, name: &str, target: String) -> bool {
    roster.record_kick(name);
    if roster.contains(&target) {
        roster.send_to(&target, &Record::new(tag::KICK, ""));
        roster.remove(&target);
        println!("({target} has left the chat)");
        roster.broadcast(&Record::new(tag::LEAVE, &target));
    }
    target == name
}

fn handle_leave(roster: &Roster, name: &str) {
    roster.record_leave();
    println!("({name} has left the chat)");
    roster.remove(name);
    roster.broadcast(&Record::new(tag::LEAVE, name));
}
