//! Client send task: reads user input and forwards it as `SAY:` or, for a
//! `*`-prefixed line, verbatim after stripping the leading `*`.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::error::ChatError;
use crate::negotiated::Negotiated;

/// Blocks until the handshake has completed, then relays stdin lines until
/// end-of-input. A clean end-of-input is the only non-fatal termination on
/// the client.
pub async fn run<R>(mut stdin: R, tx: mpsc::Sender<String>, negotiated: Arc<Negotiated>) -> Result<(), ChatError>
where
    R: AsyncBufRead + Unpin,
{
    negotiated.wait().await;

    let mut buf = String::new();
    loop {
        buf.clear();
        let n = stdin.read_line(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        let line = buf.trim_end_matches(['\n', '\r']);
        let out = match line.strip_prefix('*') {
            Some(rest) => format!("{rest}\n"),
            None => format!("SAY:{line}\n"),
        };
        if tx.send(out).await.is_err() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn star_prefixed_line_is_forwarded_raw() {
        let negotiated = Arc::new(Negotiated::new());
        negotiated.mark_ready();
        let stdin = BufReader::new(&b"*LIST:\n"[..]);
        let (tx, mut rx) = mpsc::channel(4);

        run(stdin, tx, negotiated).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "LIST:\n");
    }

    #[tokio::test]
    async fn plain_line_becomes_say() {
        let negotiated = Arc::new(Negotiated::new());
        negotiated.mark_ready();
        let stdin = BufReader::new(&b"hello there\n"[..]);
        let (tx, mut rx) = mpsc::channel(4);

        run(stdin, tx, negotiated).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "SAY:hello there\n");
    }

    #[tokio::test]
    async fn empty_input_ends_cleanly() {
        let negotiated = Arc::new(Negotiated::new());
        negotiated.mark_ready();
        let stdin = BufReader::new(&b""[..]);
        let (tx, _rx) = mpsc::channel(4);

        run(stdin, tx, negotiated).await.unwrap();
    }
}
