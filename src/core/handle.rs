//! # StreamHandle: the caller's grip on a running stream.
//!
//! The handle is cheap to clone; all clones control the same stream.
//!
//! ```text
//! close() ──► token.cancel()
//!               ├─► supervisor: abandons open/read/sleep, drops the source
//!               └─► dispatcher: stops taking lines, drains listener workers
//!                     └─► driver: state = Closed, publish Closed
//! ```
//!
//! `close()` never waits, so it is safe from inside a listener callback.
//! Use [`StreamHandle::closed`] to wait for full shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::state::{CloseReason, ConnectionState, StateCell};
use crate::events::{Bus, Event};

pub(crate) struct Shared {
    pub(crate) token: CancellationToken,
    pub(crate) state: StateCell,
    pub(crate) reason: OnceLock<CloseReason>,
    pub(crate) bus: Bus,
    closing: AtomicBool,
}

impl Shared {
    pub(crate) fn new(bus: Bus) -> Self {
        Self {
            token: CancellationToken::new(),
            state: StateCell::new(),
            reason: OnceLock::new(),
            bus,
            closing: AtomicBool::new(false),
        }
    }
}

/// Handle to one open stream.
#[derive(Clone)]
pub struct StreamHandle {
    shared: Arc<Shared>,
}

impl StreamHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Requests the stream to stop. Idempotent, never blocks.
    pub fn close(&self) {
        if self.shared.closing.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.shared.reason.set(CloseReason::Requested);
        debug!(target: "firehose::handle", "close requested");
        self.shared.token.cancel();
    }

    /// Whether the stream is closed or closing.
    pub fn is_closed(&self) -> bool {
        self.shared.token.is_cancelled() || self.state().is_terminal()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state.get()
    }

    /// Why the stream closed; `None` while it is running.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.shared.reason.get().copied()
    }

    /// Waits until the stream reached [`ConnectionState::Closed`]: the
    /// supervisor and dispatcher have stopped and every listener worker has
    /// finished its in-flight messages.
    pub async fn closed(&self) -> CloseReason {
        let mut rx = self.shared.state.watch();
        let _ = rx.wait_for(|s| s.is_terminal()).await;
        self.close_reason().unwrap_or(CloseReason::Requested)
    }

    /// Subscribes to lifecycle events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("state", &self.state())
            .field("close_reason", &self.close_reason())
            .finish()
    }
}
