//! End-to-end chat scenarios driven over real loopback TCP: name collisions,
//! broadcast fan-out, kicks, non-printable scrubbing, and stats accounting.

use std::sync::Arc;
use std::time::Duration;

use chat_protocol::record::tag;
use chat_protocol::Record;
use chat_server::roster::Roster;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
    buf: String,
}

impl TestClient {
    async fn connect(port: u16) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        TestClient {
            reader: BufReader::new(read_half),
            writer: write_half,
            buf: String::new(),
        }
    }

    async fn send(&mut self, tag: &str, payload: &str) {
        let mut line = Record::new(tag, payload).to_line();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn recv(&mut self) -> Record {
        chat_protocol::read_record(&mut self.reader, &mut self.buf)
            .await
            .unwrap()
            .expect("stream ended unexpectedly")
    }

    /// Joins with `name`, handling one round of auth, returning once fully entered.
    async fn join(port: u16, secret: &str, name: &str) -> Self {
        let mut client = Self::connect(port).await;
        assert_eq!(client.recv().await.tag, tag::AUTH);
        client.send(tag::AUTH, secret).await;
        assert_eq!(client.recv().await.tag, tag::OK);
        assert_eq!(client.recv().await.tag, tag::WHO);
        client.send(tag::NAME, name).await;
        assert_eq!(client.recv().await.tag, tag::OK);
        client
    }
}

async fn start_server(secret: &str) -> (u16, Arc<Roster>) {
    let roster = Arc::new(Roster::new());
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let secret: Arc<str> = Arc::from(secret);

    let accept_roster = roster.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::spawn(chat_server::connection::handle(
                stream,
                accept_roster.clone(),
                secret.clone(),
            ));
        }
    });
    (port, roster)
}

#[tokio::test]
async fn s1_name_collision_gets_suffixed() {
    let (port, _roster) = start_server("noauth").await;
    let _a = TestClient::join(port, "noauth", "Fred").await;

    let mut b = TestClient::connect(port).await;
    assert_eq!(b.recv().await.tag, tag::AUTH);
    b.send(tag::AUTH, "anything").await;
    assert_eq!(b.recv().await.tag, tag::OK);
    assert_eq!(b.recv().await.tag, tag::WHO);
    b.send(tag::NAME, "Fred").await;
    assert_eq!(b.recv().await.tag, tag::NAME_TAKEN);
    assert_eq!(b.recv().await.tag, tag::WHO);
    b.send(tag::NAME, "Fred0").await;
    let ok = b.recv().await;
    assert_eq!(ok.tag, tag::OK);
}

#[tokio::test]
async fn s2_broadcast_order_and_say_counter() {
    let (port, roster) = start_server("noauth").await;
    let mut a = TestClient::join(port, "noauth", "Fred").await;
    let mut b = TestClient::join(port, "noauth", "Wilma").await;
    // a sees b's ENTER broadcast
    assert_eq!(a.recv().await, Record::new(tag::ENTER, "Wilma"));

    a.send(tag::SAY, "hello").await;
    assert_eq!(a.recv().await, Record::new(tag::MSG, "Fred:hello"));
    assert_eq!(b.recv().await, Record::new(tag::MSG, "Fred:hello"));

    let (_clients, counters) = roster.stats_snapshot();
    assert_eq!(counters.say, 1);
}

#[tokio::test]
async fn s3_kick_self_removes_and_broadcasts_leave() {
    let (port, roster) = start_server("noauth").await;
    let mut a = TestClient::join(port, "noauth", "Fred").await;
    let mut b = TestClient::join(port, "noauth", "Wilma").await;
    assert_eq!(a.recv().await, Record::new(tag::ENTER, "Wilma"));

    a.send(tag::KICK, "Fred").await;
    assert_eq!(a.recv().await, Record::new(tag::KICK, ""));
    assert_eq!(b.recv().await, Record::new(tag::LEAVE, "Fred"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!roster.contains("Fred"));
}

#[tokio::test]
async fn s4_non_printable_scrubbed_in_broadcast() {
    let (port, _roster) = start_server("noauth").await;
    let mut a = TestClient::join(port, "noauth", "C").await;

    a.send(tag::SAY, "hi\u{0001}there").await;
    let msg = a.recv().await;
    assert_eq!(msg, Record::new(tag::MSG, "C:hi?there"));
}

#[tokio::test]
async fn s5_stats_snapshot_matches_activity() {
    let (port, roster) = start_server("noauth").await;
    let mut a = TestClient::join(port, "noauth", "A").await;
    let mut b = TestClient::join(port, "noauth", "B").await;
    assert_eq!(a.recv().await, Record::new(tag::ENTER, "B"));

    a.send(tag::SAY, "one").await;
    let _ = a.recv().await;
    let _ = b.recv().await;
    a.send(tag::SAY, "two").await;
    let _ = a.recv().await;
    let _ = b.recv().await;
    a.send(tag::LIST, "").await;
    let _ = a.recv().await;

    b.send(tag::KICK, "nonexistent").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (clients, counters) = roster.stats_snapshot();
    let a_entry = clients.iter().find(|(name, ..)| name == "A").unwrap();
    assert_eq!((a_entry.1, a_entry.2, a_entry.3), (2, 0, 1));
    let b_entry = clients.iter().find(|(name, ..)| name == "B").unwrap();
    assert_eq!((b_entry.1, b_entry.2, b_entry.3), (0, 1, 0));

    assert_eq!(counters.say, 2);
    assert_eq!(counters.kick, 1);
    assert_eq!(counters.list, 1);
    assert_eq!(counters.auth, 2);
    assert_eq!(counters.name, 2);
}

#[tokio::test]
async fn leave_is_clean_and_broadcast_once() {
    let (port, roster) = start_server("noauth").await;
    let mut a = TestClient::join(port, "noauth", "Fred").await;
    let mut b = TestClient::join(port, "noauth", "Wilma").await;
    assert_eq!(a.recv().await, Record::new(tag::ENTER, "Wilma"));

    a.send(tag::LEAVE, "").await;
    assert_eq!(b.recv().await, Record::new(tag::LEAVE, "Fred"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!roster.contains("Fred"));
    let (_clients, counters) = roster.stats_snapshot();
    assert_eq!(counters.leave, 1);
}

#[tokio::test]
async fn auth_mismatch_rejects_connection() {
    let (port, _roster) = start_server("realsecret").await;
    let mut client = TestClient::connect(port).await;
    assert_eq!(client.recv().await.tag, tag::AUTH);
    client.send(tag::AUTH, "wrong").await;

    let mut buf = String::new();
    let result = chat_protocol::read_record(&mut client.reader, &mut buf).await.unwrap();
    assert!(result.is_none(), "server should close the connection on auth mismatch");
}
