use std::process::ExitCode;
use std::sync::Arc;

use chat_client::config::{self, ClientArgs};
use chat_client::error::ChatError;
use chat_client::naming::NamingState;
use chat_client::negotiated::Negotiated;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Outbox channel depth, shared by the handshake replies and every `SAY`.
const OUTBOX_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match ClientArgs::parse_or_usage() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    let filter = EnvFilter::from_default_env().add_directive("chat_client=info".parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let secret = match config::resolve_secret(&args.authfile) {
        Ok(secret) => secret,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    match run(args.name, secret, args.port).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

async fn run(name: String, secret: String, port: u16) -> Result<(), ChatError> {
    let stream = TcpStream::connect(("localhost", port)).await?;
    let (read_half, mut write_half) = stream.into_split();
    let reader = BufReader::new(read_half);
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOX_CAPACITY);

    let writer_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if write_half.flush().await.is_err() {
                break;
            }
        }
    });

    let naming = Arc::new(NamingState::new(name));
    let negotiated = Arc::new(Negotiated::new());
    let stdin = BufReader::new(tokio::io::stdin());

    let recv_tx = tx.clone();
    let recv_naming = naming.clone();
    let recv_negotiated = negotiated.clone();
    let recv_secret = secret;
    let receive_handle = tokio::spawn(async move {
        chat_client::receive::run(reader, recv_tx, recv_naming, recv_negotiated, &recv_secret).await
    });

    let send_handle = tokio::spawn(chat_client::send::run(stdin, tx, negotiated));

    // Whichever task reaches a fatal exit (or clean end-of-input on the
    // send side) decides the process outcome; the other is left running
    // and dies with the process, matching the handshake's no-cleanup-
    // coordination model.
    let result = tokio::select! {
        r = receive_handle => Err(r.unwrap_or(ChatError::Communications(std::io::Error::other("receive task panicked")))),
        r = send_handle => r.unwrap_or(Err(ChatError::Communications(std::io::Error::other("send task panicked")))),
    };

    drop(writer_task);
    result
}
