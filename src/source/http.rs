//! # HTTP stream factory.
//!
//! Opens streaming endpoints with `reqwest` and reads the chunked response body
//! line by line.
//!
//! | Outcome                          | Result                                  |
//! |----------------------------------|-----------------------------------------|
//! | 2xx response                     | `ReaderLineSource` over the body stream |
//! | non-2xx response                 | `Connection { status: Some(code) }`     |
//! | DNS / connect / TLS / timeout    | `Connection { status: None }`           |
//! | body read error mid-stream       | `Transport`                             |

use async_trait::async_trait;
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::config::Config;
use crate::error::StreamFault;
use crate::source::factory::{ConnectionRequest, Method, StreamFactory};
use crate::source::line::{BoxLineSource, ReaderLineSource};

/// [`StreamFactory`] over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpStreamFactory {
    client: reqwest::Client,
    max_line: Option<usize>,
}

impl HttpStreamFactory {
    /// Builds a client honoring `config.connect_timeout` and `config.max_line_bytes`.
    pub fn new(config: &Config) -> Result<Self, StreamFault> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.connect_limit() {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| StreamFault::unreachable(format!("http client setup: {e}")))?;
        Ok(Self {
            client,
            max_line: config.line_limit(),
        })
    }

    /// Uses a preconfigured client (proxies, custom TLS roots, ...).
    pub fn with_client(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            max_line: config.line_limit(),
        }
    }
}

#[async_trait]
impl StreamFactory for HttpStreamFactory {
    fn name(&self) -> &str {
        "http"
    }

    async fn open(&self, request: &ConnectionRequest) -> Result<BoxLineSource, StreamFault> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };
        let mut builder = self.client.request(method, request.target.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StreamFault::unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unexpected status");
            return Err(StreamFault::refused(status.as_u16(), reason));
        }
        debug!(target: "firehose::http", status = status.as_u16(), url = %request.target, "stream opened");

        let body = response.bytes_stream().map_err(std::io::Error::other);
        let reader = StreamReader::new(Box::pin(body));
        Ok(Box::new(
            ReaderLineSource::new(reader).with_max_line(self.max_line),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::line::LineSource;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response on a local port.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let mut seen = Vec::new();
            while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                seen.extend_from_slice(&buf[..n]);
            }
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.unwrap();
        });
        format!("http://{addr}/stream")
    }

    #[tokio::test]
    async fn test_non_success_status_is_refusal() {
        let url = serve_once("HTTP/1.1 420 Enhance Your Calm\r\nContent-Length: 0\r\n\r\n").await;
        let factory = HttpStreamFactory::new(&Config::default()).unwrap();
        let err = factory.open(&ConnectionRequest::get(url)).await.err().unwrap();
        assert_eq!(err.status(), Some(420));
    }

    #[tokio::test]
    async fn test_unreachable_has_no_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let factory = HttpStreamFactory::new(&Config::default()).unwrap();
        let err = factory
            .open(&ConnectionRequest::get(format!("http://{addr}/")))
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), None);
        assert_eq!(err.as_label(), "connection_failed");
    }

    #[tokio::test]
    async fn test_body_is_read_line_by_line() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 22\r\n\r\n{\"limit\":{\"track\":5}}\n",
        )
        .await;
        let factory = HttpStreamFactory::new(&Config::default()).unwrap();
        let mut src = factory
            .open(&ConnectionRequest::post(url, "track=rust"))
            .await
            .unwrap();
        assert_eq!(src.next_line().await.unwrap(), r#"{"limit":{"track":5}}"#);
        assert!(matches!(
            src.next_line().await,
            Err(StreamFault::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn test_silent_body_is_a_transport_fault() {
        use crate::{EventKind, FaultKind, StreamBuilder};
        use std::sync::Arc;
        use std::time::Duration;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf).await.unwrap();
            sock.write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n")
                .await
                .unwrap();
            // Headers only; the socket stays open and silent.
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(sock);
        });

        let cfg = Config {
            read_timeout: Duration::from_millis(200),
            ..Config::default()
        };
        let factory = Arc::new(HttpStreamFactory::new(&cfg).unwrap());
        let (handle, mut events) =
            StreamBuilder::new(factory, ConnectionRequest::get(format!("http://{addr}/stream")))
                .with_config(cfg)
                .open_subscribed();

        let fault = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let ev = events.recv().await.unwrap();
                if ev.kind == EventKind::TransportFailed {
                    return ev;
                }
            }
        })
        .await
        .expect("silent stream was never dropped");
        assert_eq!(fault.fault, Some(FaultKind::Transport));
        assert!(fault.reason.as_deref().unwrap().contains("stalled"));

        handle.close();
        handle.closed().await;
    }
}
