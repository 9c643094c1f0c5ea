//! # Connection state of a stream.
//!
//! ```text
//!                 ┌────────────── Faulted ◄──────────┐
//!                 ▼                  ▲               │
//! Disconnected ─► Connecting ─► Connected ───────────┘
//!       │             │              │
//!       └─────────────┴──────────────┴─────────► Closed (terminal)
//! ```
//!
//! [`StateCell`] is the single writer; readers hold a `watch::Receiver` and
//! always see the latest value.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

/// Observable state of a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not started yet.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// A stream is open and being read.
    Connected,
    /// The last attempt or stream failed; a retry may follow.
    Faulted,
    /// Terminal. No more events, no more listener calls.
    Closed,
}

impl ConnectionState {
    /// Returns a stable lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Faulted => "faulted",
            Self::Closed => "closed",
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Disconnected | Faulted, Connecting) => true,
            (Connecting, Connected | Faulted) => true,
            (Connected, Faulted) => true,
            _ => false,
        }
    }

    /// Whether this is the terminal state.
    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a stream reached [`ConnectionState::Closed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// `close()` was called.
    Requested,
    /// The refused-connection backoff passed its ceiling.
    BackoffExhausted {
        /// Status code of the last refusal.
        status: Option<u16>,
    },
}

/// Single-writer cell for the current [`ConnectionState`].
#[derive(Clone, Debug)]
pub(crate) struct StateCell {
    tx: Arc<watch::Sender<ConnectionState>>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Disconnected);
        Self { tx: Arc::new(tx) }
    }

    pub(crate) fn get(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Moves to `next` if legal. Illegal moves are logged and ignored.
    pub(crate) fn set(&self, next: ConnectionState) -> bool {
        let current = self.get();
        if current == next {
            return true;
        }
        if !current.can_transition(next) {
            warn!(
                target: "firehose::state",
                from = current.as_str(),
                to = next.as_str(),
                "illegal connection state transition ignored"
            );
            return false;
        }
        self.tx.send_replace(next);
        true
    }
}
