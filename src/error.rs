//! Error types used by the streaming runtime.
//!
//! This module defines two error enums:
//!
//! - [`StreamFault`]: a stream could not be opened, or an open stream died.
//! - [`DecodeError`]: a single classified line could not be decoded.
//!
//! Both provide `as_label` for logs/metrics. [`StreamFault::kind`] selects the
//! backoff regime the supervisor applies.

use thiserror::Error;

/// Coarse classification of a [`StreamFault`], used to pick a backoff regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The far end answered and refused the connection (status code known).
    Refused,
    /// Network-level failure: no response at all, or a live stream died.
    Network,
}

/// # Faults raised while opening or reading a stream.
///
/// The split between [`StreamFault::Connection`] and [`StreamFault::Transport`]
/// matters: a connection fault **with** a status code is a refusal and backs off
/// exponentially until a ceiling closes the stream; every other fault backs off
/// linearly and retries forever.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamFault {
    /// The stream could not be opened.
    #[error("{}", connection_message(.status, .message))]
    Connection {
        /// Protocol status code, if the remote answered.
        status: Option<u16>,
        /// Underlying error message.
        message: String,
    },

    /// An open stream failed mid-read (IO error or end of stream).
    #[error("transport failed: {message}")]
    Transport {
        /// Underlying error message.
        message: String,
    },
}

fn connection_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("connection refused with status {code}: {message}"),
        None => format!("connection failed: {message}"),
    }
}

impl StreamFault {
    /// Connection refused by the remote with the given status code.
    pub fn refused(status: u16, message: impl Into<String>) -> Self {
        StreamFault::Connection {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Connection attempt failed below the protocol layer (DNS, connect, TLS).
    pub fn unreachable(message: impl Into<String>) -> Self {
        StreamFault::Connection {
            status: None,
            message: message.into(),
        }
    }

    /// An open stream died.
    pub fn transport(message: impl Into<String>) -> Self {
        StreamFault::Transport {
            message: message.into(),
        }
    }

    /// Returns the protocol status code, when the remote provided one.
    pub fn status(&self) -> Option<u16> {
        match self {
            StreamFault::Connection { status, .. } => *status,
            StreamFault::Transport { .. } => None,
        }
    }

    /// Returns the backoff regime this fault belongs to.
    ///
    /// # Example
    /// ```
    /// use firehose::{FaultKind, StreamFault};
    ///
    /// assert_eq!(StreamFault::refused(420, "enhance your calm").kind(), FaultKind::Refused);
    /// assert_eq!(StreamFault::unreachable("dns").kind(), FaultKind::Network);
    /// assert_eq!(StreamFault::transport("eof").kind(), FaultKind::Network);
    /// ```
    pub fn kind(&self) -> FaultKind {
        match self.status() {
            Some(_) => FaultKind::Refused,
            None => FaultKind::Network,
        }
    }

    /// True if the remote refused with a status code.
    pub fn is_refused(&self) -> bool {
        self.kind() == FaultKind::Refused
    }

    /// True if an open stream died mid-read.
    pub fn is_transport(&self) -> bool {
        matches!(self, StreamFault::Transport { .. })
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StreamFault::Connection { status: Some(_), .. } => "connection_refused",
            StreamFault::Connection { status: None, .. } => "connection_failed",
            StreamFault::Transport { .. } => "transport_failed",
        }
    }
}

impl From<std::io::Error> for StreamFault {
    fn from(err: std::io::Error) -> Self {
        StreamFault::transport(err.to_string())
    }
}

/// # Error decoding a classified line into its payload.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The line is not valid JSON for the expected shape.
    #[error("malformed {shape} payload: {source}")]
    Malformed {
        /// Expected payload shape (e.g. "status").
        shape: &'static str,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DecodeError::Malformed { .. } => "decode_malformed",
        }
    }
}
