//! Stats reporter: waits on the reload signal, then dumps counters to the
//! diagnostic stream.

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};

use crate::roster::Roster;

/// Runs forever, printing a stats dump to stderr each time the reload
/// signal (SIGHUP) arrives. Spawn this once per process.
pub async fn run(roster: Arc<Roster>) -> std::io::Result<()> {
    let mut reload = signal(SignalKind::hangup())?;
    loop {
        reload.recv().await;
        dump(&roster);
    }
}

fn dump(roster: &Roster) {
    let (clients, counters) = roster.stats_snapshot();

    eprintln!("@CLIENTS@");
    for (name, say, kick, list) in &clients {
        eprintln!("{name}:SAY:{say}:KICK:{kick}:LIST:{list}");
    }
    eprintln!("@SERVER@");
    eprintln!(
        "server:AUTH:{}:NAME:{}:SAY:{}:KICK:{}:LIST:{}:LEAVE:{}",
        counters.auth, counters.name, counters.say, counters.kick, counters.list, counters.leave
    );
    tracing::info!(clients = clients.len(), "stats dump emitted");
}
