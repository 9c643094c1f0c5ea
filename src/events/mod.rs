//! Lifecycle events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the supervisor (connection and backoff events), the
//!   dispatcher (`DecodeFailed`), the listener set (panic, lagging).
//! - **Consumers**: whoever holds a [`StreamHandle`](crate::StreamHandle) and
//!   calls `subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
