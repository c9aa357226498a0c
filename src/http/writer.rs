use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes a response into wire bytes.
///
/// Headers are written as stored; framing headers are the caller's business
/// (`ResponseBuilder` adds Content-Length).
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128 + resp.body_bytes().len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    for (k, v) in resp.headers.iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf.extend_from_slice(resp.body_bytes());

    buf
}

/// Formats one server-sent event: a `data:` line per input line, then a blank line.
pub fn serialize_event(data: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(data.len() + 8);
    for line in data.split('\n') {
        buf.extend_from_slice(b"data: ");
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }
    buf.push(b'\n');
    buf
}

/// Writes an already serialized response, resuming where a partial write stopped.
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self::from_bytes(serialize_response(response))
    }

    pub fn from_bytes(buffer: Vec<u8>) -> Self {
        Self { buffer, written: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.written
    }

    /// Writes everything that is left to `stream`.
    pub async fn write_to<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        self.write_chunked(stream, usize::MAX).await
    }

    /// Writes what is left in pieces of at most `chunk` bytes, flushing each.
    pub async fn write_chunked<W>(&mut self, stream: &mut W, chunk: usize) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let chunk = chunk.max(1);
        while self.written < self.buffer.len() {
            let end = self.buffer.len().min(self.written.saturating_add(chunk));
            let n = stream.write(&self.buffer[self.written..end]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
            stream.flush().await?;
        }

        Ok(())
    }
}
