//! # Lifecycle events emitted by a stream.
//!
//! The [`EventKind`] enum classifies what happened inside the runtime:
//! - **Connection events**: connecting, connected, connect failed, transport failed
//! - **Backoff events**: scheduled, exhausted
//! - **Delivery events**: decode failed, listener panicked, listener lagging
//! - **Terminal event**: closed
//!
//! The [`Event`] struct carries metadata such as timestamps, status codes,
//! delays and reasons. These are observability records; stream content goes to
//! [`Listener`](crate::Listener)s, never through this bus.
//!
//! ## Ordering guarantees
//! Each event has a globally unique, monotonically increasing sequence number
//! (`seq`).
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use firehose::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_status(420)
//!     .with_delay(Duration::from_secs(5))
//!     .with_attempt(1);
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.delay(), Some(Duration::from_secs(5)));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::ConnectionState;
use crate::error::{FaultKind, StreamFault};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Connection events ===
    /// The supervisor is asking the factory for a new stream.
    ///
    /// Sets: `attempt` (1-based, counts every open attempt of this stream)
    Connecting,

    /// A stream was opened; backoff was reset.
    ///
    /// Sets: `attempt`
    Connected,

    /// The factory failed to open a stream.
    ///
    /// Sets: `attempt`, `status` (if refused), `fault`, `reason`
    ConnectFailed,

    /// An open stream died mid-read.
    ///
    /// Sets: `fault`, `reason`
    TransportFailed,

    // === Backoff events ===
    /// A reconnect is scheduled after `delay`.
    ///
    /// Sets: `attempt` (consecutive failures of this kind), `delay_ms`, `fault`, `status`
    BackoffScheduled,

    /// The refused-connection regime passed its ceiling; the stream closes.
    ///
    /// Sets: `attempt`, `status`, `fault`
    BackoffExhausted,

    // === Delivery events ===
    /// A classified line could not be decoded and was dropped.
    ///
    /// Sets: `reason`
    DecodeFailed,

    /// A listener panicked while handling a message.
    ///
    /// Sets: `listener`, `reason`
    ListenerPanicked,

    /// A listener's backlog reached its warning threshold. Nothing is dropped.
    ///
    /// Sets: `listener`, `attempt` (backlog size), `reason`
    ListenerLagging,

    // === Terminal ===
    /// The stream is closed; no further events follow.
    Closed,
}

/// Lifecycle event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Attempt or failure count, depending on the kind.
    pub attempt: Option<u32>,
    /// Protocol status code of a refused connection.
    pub status: Option<u16>,
    /// Backoff delay in milliseconds.
    pub delay_ms: Option<u64>,
    /// Backoff regime the fault belongs to.
    pub fault: Option<FaultKind>,
    /// Listener name, for delivery events.
    pub listener: Option<Arc<str>>,
    /// Human-readable reason (errors, panic messages).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            attempt: None,
            status: None,
            delay_ms: None,
            fault: None,
            listener: None,
            reason: None,
        }
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a status code.
    #[inline]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a listener name.
    #[inline]
    pub fn with_listener(mut self, name: impl Into<Arc<str>>) -> Self {
        self.listener = Some(name.into());
        self
    }

    /// Attaches fault details: kind, status (if any) and message.
    pub fn with_fault(mut self, fault: &StreamFault) -> Self {
        self.fault = Some(fault.kind());
        self.status = fault.status();
        self.reason = Some(fault.to_string().into());
        self
    }

    /// Returns the backoff delay, if set.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }

    /// Creates a listener panic event.
    #[inline]
    pub fn listener_panicked(listener: &'static str, info: String) -> Self {
        Event::new(EventKind::ListenerPanicked)
            .with_listener(listener)
            .with_reason(info)
    }

    /// Creates a listener lagging event for a backlog of `pending` messages.
    #[inline]
    pub fn listener_lagging(listener: &'static str, pending: usize) -> Self {
        Event::new(EventKind::ListenerLagging)
            .with_listener(listener)
            .with_attempt(u32::try_from(pending).unwrap_or(u32::MAX))
            .with_reason(format!("{pending} messages pending"))
    }

    /// Returns the connection state this event implies, if it is a transition.
    pub fn implied_state(&self) -> Option<ConnectionState> {
        match self.kind {
            EventKind::Connecting => Some(ConnectionState::Connecting),
            EventKind::Connected => Some(ConnectionState::Connected),
            EventKind::ConnectFailed | EventKind::TransportFailed => {
                Some(ConnectionState::Faulted)
            }
            EventKind::Closed => Some(ConnectionState::Closed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::Connecting);
        let b = Event::new(EventKind::Connected);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_with_fault_copies_status_and_kind() {
        let ev = Event::new(EventKind::ConnectFailed).with_fault(&StreamFault::refused(401, "no"));
        assert_eq!(ev.status, Some(401));
        assert_eq!(ev.fault, Some(FaultKind::Refused));
        assert!(ev.reason.as_deref().unwrap_or_default().contains("401"));

        let ev = Event::new(EventKind::TransportFailed).with_fault(&StreamFault::transport("eof"));
        assert_eq!(ev.status, None);
        assert_eq!(ev.fault, Some(FaultKind::Network));
    }

    #[test]
    fn test_implied_state() {
        assert_eq!(
            Event::new(EventKind::TransportFailed).implied_state(),
            Some(ConnectionState::Faulted)
        );
        assert_eq!(Event::new(EventKind::DecodeFailed).implied_state(), None);
    }
}
