//! # Listener trait
//!
//! `Listener` is the extension point for consuming stream content. Each
//! listener is driven by a dedicated worker fed by its own unbounded queue, so
//! every decoded message reaches every listener exactly once.
//!
//! ## Contract
//! - One method per message kind; all default to no-ops.
//! - Implementations may be slow: they block neither the stream reader nor
//!   other listeners.
//! - No assumption about the calling task/thread, nor about ordering relative
//!   to other listeners.
//! - A panic is caught and reported as `ListenerPanicked`; the listener keeps
//!   receiving subsequent messages.

use async_trait::async_trait;

use crate::message::{DeletionNotice, StallWarning, Status, StreamMessage};

/// Consumer of decoded stream messages.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// A status (tweet-like) payload arrived.
    async fn on_status(&self, _status: &Status) {}

    /// A previously delivered status was deleted.
    async fn on_delete(&self, _notice: &DeletionNotice) {}

    /// `undelivered` matching statuses were withheld by the track limit.
    async fn on_track_limit(&self, _undelivered: u64) {}

    /// The server warned that this client is falling behind.
    async fn on_stall_warning(&self, _warning: &StallWarning) {}

    /// Human-readable name (for logs/events).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Backlog size at which `ListenerLagging` is published (`0` = never).
    /// Messages are never dropped.
    fn backlog_warning(&self) -> usize {
        1024
    }
}

/// Routes one message to the matching callback.
pub(crate) async fn deliver(listener: &dyn Listener, msg: &StreamMessage) {
    match msg {
        StreamMessage::Status(status) => listener.on_status(status).await,
        StreamMessage::Delete(notice) => listener.on_delete(notice).await,
        StreamMessage::TrackLimit(n) => listener.on_track_limit(*n).await,
        StreamMessage::Warning(warning) => listener.on_stall_warning(warning).await,
    }
}
