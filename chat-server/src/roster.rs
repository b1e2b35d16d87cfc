//! Roster: ordered set of connected clients, plus the server-wide counters
//! that are linearized with it under the same lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

use chat_protocol::{record::tag, Record};

/// Outgoing message slot for one connected client; the session's writer task
/// drains this channel and performs the actual socket write.
pub type Outbox = mpsc::Sender<String>;

/// A roster entry.
pub struct ClientRecord {
    /// Raw name as supplied by the client; used for identity and ordering.
    /// Display scrubbing (non-printables → `?`) happens at render time, never here.
    pub name: String,
    tx: Outbox,
    /// Forces the owning session's read loop to stop, for kicks. Closing the
    /// socket from another task isn't possible in safe async Rust, so a kick
    /// wakes the victim's session the same way end-of-stream would.
    disconnect: Arc<Notify>,
    pub say: u64,
    pub kick: u64,
    pub list: u64,
}

/// Aggregate, monotone server counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerCounters {
    pub auth: u64,
    pub name: u64,
    pub say: u64,
    pub kick: u64,
    pub list: u64,
    pub leave: u64,
}

struct Inner {
    clients: BTreeMap<String, ClientRecord>,
    counters: ServerCounters,
}

/// The ordered roster, its own lock, and the server counters — all
/// mutated under one [`parking_lot::Mutex`] so counter increments,
/// inserts/removes, and broadcasts linearize with each other.
pub struct Roster {
    inner: Mutex<Inner>,
}

impl Roster {
    pub fn new() -> Self {
        Roster {
            inner: Mutex::new(Inner {
                clients: BTreeMap::new(),
                counters: ServerCounters::default(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().clients.contains_key(name)
    }

    /// Atomically checks for and inserts `name`, returning the [`Notify`] the
    /// caller's session should race against its next read. `None` if the
    /// name was already present (precondition violated by another session
    /// winning the race).
    pub fn insert_if_absent(&self, name: &str, tx: Outbox) -> Option<Arc<Notify>> {
        let mut inner = self.inner.lock();
        if inner.clients.contains_key(name) {
            return None;
        }
        let disconnect = Arc::new(Notify::new());
        inner.clients.insert(
            name.to_string(),
            ClientRecord {
                name: name.to_string(),
                tx,
                disconnect: disconnect.clone(),
                say: 0,
                kick: 0,
                list: 0,
            },
        );
        Some(disconnect)
    }

    /// Removes the record for `name`, if present, and notifies its session
    /// so a forced kick unblocks the victim's read loop. No-op on an absent
    /// name.
    pub fn remove(&self, name: &str) {
        if let Some(record) = self.inner.lock().clients.remove(name) {
            record.disconnect.notify_one();
        }
    }

    /// Ordered snapshot of names, for `LIST:`.
    pub fn snapshot_names(&self) -> Vec<String> {
        self.inner.lock().clients.keys().cloned().collect()
    }

    /// Broadcasts one record to every current member, in roster order. Holds
    /// the lock for the whole fan-out: a slow or dead peer never aborts
    /// delivery to the rest, it just drops its own message (the channel send
    /// is non-blocking and failures are logged, not propagated).
    pub fn broadcast(&self, record: &Record) {
        let line = {
            let mut l = record.to_line();
            l.push('\n');
            l
        };
        let inner = self.inner.lock();
        for client in inner.clients.values() {
            if client.tx.try_send(line.clone()).is_err() {
                tracing::warn!(name = %client.name, "broadcast: peer send buffer full or closed");
            }
        }
    }

    /// Sends one record to a single named client (used for the `KICK:` and
    /// `LIST:` replies), while holding the roster lock like every other
    /// mutation.
    pub fn send_to(&self, name: &str, record: &Record) {
        let inner = self.inner.lock();
        if let Some(client) = inner.clients.get(name) {
            let mut line = record.to_line();
            line.push('\n');
            if client.tx.try_send(line).is_err() {
                tracing::warn!(%name, "send_to: peer send buffer full or closed");
            }
        }
    }

    /// Handles one `SAY`: bumps the per-client and server counters,
    /// broadcasts the (already display-scrubbed) `MSG:name:text` to every
    /// member, and only then sleeps for `pacing` — all under the same lock
    /// acquisition. This is what serializes say handling server-wide;
    /// `await_holding_lock` is allowed workspace-wide for this reason, and
    /// parking_lot's guard has no thread affinity so holding it across the
    /// sleep is sound on the multi-thread runtime.
    pub async fn say(&self, name: &str, display_name: &str, display_text: &str, pacing: std::time::Duration) {
        let mut guard = self.inner.lock();
        guard.counters.say += 1;
        if let Some(c) = guard.clients.get_mut(name) {
            c.say += 1;
        }
        let line = format!("{}:{display_name}:{display_text}\n", tag::MSG);
        for client in guard.clients.values() {
            if client.tx.try_send(line.clone()).is_err() {
                tracing::warn!(name = %client.name, "say broadcast: peer send buffer full or closed");
            }
        }
        tokio::time::sleep(pacing).await;
    }

    pub fn record_list(&self, name: &str) {
        let mut inner = self.inner.lock();
        inner.counters.list += 1;
        if let Some(c) = inner.clients.get_mut(name) {
            c.list += 1;
        }
    }

    pub fn record_kick(&self, name: &str) {
        let mut inner = self.inner.lock();
        inner.counters.kick += 1;
        if let Some(c) = inner.clients.get_mut(name) {
            c.kick += 1;
        }
    }

    pub fn record_leave(&self) {
        self.inner.lock().counters.leave += 1;
    }

    pub fn record_auth(&self) {
        self.inner.lock().counters.auth += 1;
    }

    pub fn record_name(&self) {
        self.inner.lock().counters.name += 1;
    }

    /// Consistent snapshot for the stats dump: per-client counters in
    /// roster order, plus the aggregate counters.
    pub fn stats_snapshot(&self) -> (Vec<(String, u64, u64, u64)>, ServerCounters) {
        let inner = self.inner.lock();
        let clients = inner
            .clients
            .values()
            .map(|c| (c.name.clone(), c.say, c.kick, c.list))
            .collect();
        (clients, inner.counters)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}
