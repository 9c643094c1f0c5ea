//! # Line source: one text line per call from a live byte stream.
//!
//! [`LineSource`] is what the supervisor reads from. [`ReaderLineSource`]
//! implements it over any tokio [`AsyncBufRead`].
//!
//! ## Rules
//! - Trailing `\n` / `\r\n` is stripped; blank lines are returned as `""`.
//! - End of stream is a [`StreamFault::Transport`], exactly like an IO error:
//!   a streaming endpoint never ends on purpose.
//! - A line longer than the configured limit is a transport fault.
//! - `close()` is idempotent. Through [`LineSourceCloser`] it can be called
//!   while a `next_line()` is pending, which then fails promptly.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::error::StreamFault;

/// Owned, type-erased line source.
pub type BoxLineSource = Box<dyn LineSource>;

/// Contract for a live stream of text lines.
#[async_trait]
pub trait LineSource: Send + 'static {
    /// Reads the next line, waiting as long as the network read takes.
    async fn next_line(&mut self) -> Result<String, StreamFault>;

    /// Releases the underlying stream. Idempotent.
    fn close(&mut self) {}
}

/// Cloneable handle that closes a [`ReaderLineSource`] from anywhere.
#[derive(Clone, Debug)]
pub struct LineSourceCloser {
    token: CancellationToken,
}

impl LineSourceCloser {
    /// Closes the source; a pending `next_line()` fails. Idempotent.
    pub fn close(&self) {
        self.token.cancel();
    }

    /// Whether the source was closed.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// [`LineSource`] over a buffered async reader.
pub struct ReaderLineSource<R> {
    reader: R,
    buf: Vec<u8>,
    max_line: Option<usize>,
    closed: CancellationToken,
}

impl<R> ReaderLineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Wraps `reader` with no line length limit.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(4096),
            max_line: None,
            closed: CancellationToken::new(),
        }
    }

    /// Sets the longest accepted line in bytes (`None` = unlimited).
    #[must_use]
    pub fn with_max_line(mut self, limit: Option<usize>) -> Self {
        self.max_line = limit;
        self
    }

    /// Returns a handle able to close this source concurrently.
    pub fn closer(&self) -> LineSourceCloser {
        LineSourceCloser {
            token: self.closed.clone(),
        }
    }

    async fn read_raw(reader: &mut R, buf: &mut Vec<u8>, limit: Option<usize>) -> std::io::Result<usize> {
        match limit {
            Some(max) => {
                let cap = u64::try_from(max).unwrap_or(u64::MAX).saturating_add(1);
                (&mut *reader).take(cap).read_until(b'\n', buf).await
            }
            None => reader.read_until(b'\n', buf).await,
        }
    }
}

#[async_trait]
impl<R> LineSource for ReaderLineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn next_line(&mut self) -> Result<String, StreamFault> {
        if self.closed.is_cancelled() {
            return Err(StreamFault::transport("line source closed"));
        }
        self.buf.clear();

        let limit = self.max_line;
        let closed = &self.closed;
        let read = Self::read_raw(&mut self.reader, &mut self.buf, limit);

        let n = tokio::select! {
            biased;
            _ = closed.cancelled() => {
                return Err(StreamFault::transport("line source closed"));
            }
            res = read => res?,
        };

        if n == 0 {
            return Err(StreamFault::transport("end of stream"));
        }
        if self.buf.last() != Some(&b'\n') {
            return match limit {
                Some(max) if self.buf.len() > max => Err(StreamFault::transport(format!(
                    "line exceeds {max} bytes"
                ))),
                _ => Err(StreamFault::transport("end of stream inside a line")),
            };
        }

        self.buf.pop();
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        Ok(String::from_utf8_lossy(&self.buf).into_owned())
    }

    fn close(&mut self) {
        self.closed.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncWriteExt, BufReader};

    fn source(bytes: &'static [u8]) -> ReaderLineSource<&'static [u8]> {
        ReaderLineSource::new(bytes)
    }

    #[tokio::test]
    async fn test_reads_lines_and_strips_terminators() {
        let mut src = source(b"one\r\ntwo\n\nthree\n");
        assert_eq!(src.next_line().await.unwrap(), "one");
        assert_eq!(src.next_line().await.unwrap(), "two");
        assert_eq!(src.next_line().await.unwrap(), "");
        assert_eq!(src.next_line().await.unwrap(), "three");
    }

    #[tokio::test]
    async fn test_end_of_stream_is_transport_fault() {
        let mut src = source(b"only\n");
        src.next_line().await.unwrap();
        let err = src.next_line().await.unwrap_err();
        assert_eq!(err.as_label(), "transport_failed");
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_truncated_last_line_is_transport_fault() {
        let mut src = source(b"partial");
        assert!(matches!(
            src.next_line().await,
            Err(StreamFault::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_line_limit() {
        let mut src = source(b"1234\n123456789\n").with_max_line(Some(4));
        assert_eq!(src.next_line().await.unwrap(), "1234");
        let err = src.next_line().await.unwrap_err();
        assert!(err.to_string().contains("exceeds 4 bytes"), "{err}");
    }

    #[tokio::test]
    async fn test_close_unblocks_pending_read() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut src = ReaderLineSource::new(BufReader::new(client));
        let closer = src.closer();

        let pending = tokio::spawn(async move { src.next_line().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        closer.close();
        closer.close();

        let res = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .expect("read should unblock")
            .unwrap();
        assert!(matches!(res, Err(StreamFault::Transport { .. })));
        assert!(closer.is_closed());
        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut src = source(b"line\n");
        src.close();
        src.close();
        assert!(src.next_line().await.is_err());
    }
}
