//! # Stream factory: the boundary to the network/auth layer.
//!
//! The supervisor never builds URLs, signs requests or picks headers. It hands
//! a resolved [`ConnectionRequest`] to a [`StreamFactory`] and gets back either
//! a [`LineSource`](crate::LineSource) or a classified [`StreamFault`]:
//!
//! ```text
//! open(request)
//!   ├─ Ok(source)                          → Connected
//!   ├─ Err(Connection { status: Some(_) }) → refused: exponential backoff
//!   └─ Err(Connection { status: None })    → network: linear backoff
//! ```
//!
//! [`FactoryFn`] adapts a closure, which is handy for tests and for callers
//! with their own transport.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StreamFault;
use crate::source::line::BoxLineSource;

/// HTTP method of a stream request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
}

/// Fully resolved connection parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Request method.
    pub method: Method,
    /// Resolved target (for HTTP: the full URL).
    pub target: String,
    /// Request body, if any.
    pub body: Option<String>,
    /// Extra headers, already signed/encoded by the caller.
    pub headers: Vec<(String, String)>,
}

impl ConnectionRequest {
    /// `GET target`.
    pub fn get(target: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            target: target.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    /// `POST target` with a body.
    pub fn post(target: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            target: target.into(),
            body: Some(body.into()),
            headers: Vec::new(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Capability to open a stream.
#[async_trait]
pub trait StreamFactory: Send + Sync + 'static {
    /// Short name, for logs.
    fn name(&self) -> &str {
        "stream-factory"
    }

    /// Performs the handshake and returns a readable stream.
    ///
    /// Fails with a status code when the remote refused the request, and
    /// without one when the attempt failed below the protocol layer.
    async fn open(&self, request: &ConnectionRequest) -> Result<BoxLineSource, StreamFault>;
}

/// Shared factory handle.
pub type FactoryRef = Arc<dyn StreamFactory>;

/// Closure-backed factory.
///
/// The closure gets its own copy of the request and creates a fresh future per
/// attempt.
pub struct FactoryFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> FactoryFn<F> {
    /// Creates a closure-backed factory.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the factory as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> StreamFactory for FactoryFn<F>
where
    F: Fn(ConnectionRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<BoxLineSource, StreamFault>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self, request: &ConnectionRequest) -> Result<BoxLineSource, StreamFault> {
        (self.f)(request.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{LineSource, ReaderLineSource};

    #[test]
    fn test_request_builders() {
        let req = ConnectionRequest::post("https://stream.example.com/filter", "track=rust")
            .with_header("Authorization", "OAuth x");
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body.as_deref(), Some("track=rust"));
        assert_eq!(req.headers.len(), 1);
        assert_eq!(ConnectionRequest::get("u").method, Method::Get);
    }

    #[tokio::test]
    async fn test_factory_fn_passes_request_through() {
        let factory = FactoryFn::new("fixed", |req: ConnectionRequest| async move {
            if req.target == "refuse" {
                return Err(StreamFault::refused(401, "unauthorized"));
            }
            Ok(Box::new(ReaderLineSource::new(&b"x\n"[..])) as BoxLineSource)
        });
        assert_eq!(factory.name(), "fixed");

        let mut src = factory.open(&ConnectionRequest::get("ok")).await.unwrap();
        assert_eq!(src.next_line().await.unwrap(), "x");

        let err = factory.open(&ConnectionRequest::get("refuse")).await.err();
        assert_eq!(err.and_then(|e| e.status()), Some(401));
    }
}
