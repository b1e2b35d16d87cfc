use std::process::ExitCode;
use std::sync::Arc;

use chat_server::config::{self, ServerArgs};
use chat_server::roster::Roster;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match ServerArgs::parse_or_usage() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    let filter = EnvFilter::from_default_env().add_directive("chat_server=info".parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let secret = match config::resolve_secret(&args.authfile) {
        Ok(secret) => secret,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    let roster = Arc::new(Roster::new());

    let stats_roster = roster.clone();
    tokio::spawn(async move {
        if let Err(err) = chat_server::stats::run(stats_roster).await {
            tracing::warn!("stats reporter failed to start: {err}");
        }
    });

    let port = args.port.unwrap_or(0);
    if let Err(err) = chat_server::server::run(port, secret, roster).await {
        eprintln!("{err}");
        return ExitCode::from(err.exit_code() as u8);
    }

    ExitCode::SUCCESS
}
