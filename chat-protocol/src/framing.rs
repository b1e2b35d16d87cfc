//! Line framing: newline-delimited records over any async stream.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::record::Record;

/// Reads one record, returning `None` on a clean end-of-stream (empty read).
///
/// `buf` is reused across calls by the caller to avoid reallocating per line.
pub async fn read_record<R>(reader: &mut R, buf: &mut String) -> std::io::Result<Option<Record>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let n = reader.read_line(buf).await?;
    if n == 0 {
        return Ok(None);
    }
    let line = buf.trim_end_matches(['\n', '\r']);
    Ok(Some(Record::parse(line)))
}

/// Writes one record terminated by `\n`, flushing before returning.
pub async fn write_record<W>(writer: &mut W, record: &Record) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = record.to_line();
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn reads_until_newline() {
        let data = b"AUTH:secret\nWHO:\n".to_vec();
        let mut reader = BufReader::new(&data[..]);
        let mut buf = String::new();

        let r1 = read_record(&mut reader, &mut buf).await.unwrap().unwrap();
        assert_eq!(r1, Record::new("AUTH", "secret"));

        let r2 = read_record(&mut reader, &mut buf).await.unwrap().unwrap();
        assert_eq!(r2, Record::new("WHO", ""));

        let r3 = read_record(&mut reader, &mut buf).await.unwrap();
        assert!(r3.is_none());
    }

    #[tokio::test]
    async fn empty_stream_is_no_more_records() {
        let data: Vec<u8> = Vec::new();
        let mut reader = BufReader::new(&data[..]);
        let mut buf = String::new();
        assert!(read_record(&mut reader, &mut buf).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_appends_newline_and_flushes() {
        let mut out = Vec::new();
        write_record(&mut out, &Record::new("OK", "")).await.unwrap();
        assert_eq!(out, b"OK:\n");
    }
}
