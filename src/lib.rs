//! # firehose
//!
//! **Firehose** is a persistent client for long-lived, line-delimited JSON
//! streams (the "firehose" style of social feeds).
//!
//! It keeps one logical stream alive across network faults, classifies every
//! line by shape, decodes it into a typed message and fans it out to any
//! number of listeners without letting a slow listener stall the reader.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ConnectionRequest
//!         │
//!         ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (one task per stream)                                 │
//! │  - StreamFactory::open ──► LineSource                             │
//! │  - next_line() ──► line queue (unbounded, FIFO)                   │
//! │  - faults ──► BackoffState (refused: exponential / network: linear)│
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Dispatcher (one task per stream)                                 │
//! │  classify(line) ──► decode ──► ListenerSet::emit                  │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                  ┌─────────────┼─────────────┐
//!                  ▼             ▼             ▼
//!               worker1       worker2       workerN     (bounded queue each)
//!                  ▼             ▼             ▼
//!             on_status()   on_delete()   on_track_limit() / on_stall_warning()
//!
//! Lifecycle events (Connecting, Connected, BackoffScheduled, Closed, ...)
//! ──► Bus (broadcast) ──► StreamHandle::subscribe()
//! ```
//!
//! ### Lifecycle
//! ```text
//! open() ──► Disconnected ──► Connecting ──► Connected ──► (read lines)
//!                                 ▲    │          │
//!                                 │    └──────────┴──► Faulted
//!                                 │                      │
//!                                 └──── backoff sleep ◄──┘
//!                                              │
//!                    refused past the ceiling  ▼
//!  close() ──────────────────────────────────► Closed
//! ```
//!
//! ## Features
//! | Area              | Description                                             | Key types / traits                          |
//! |-------------------|---------------------------------------------------------|---------------------------------------------|
//! | **Listeners**     | Receive decoded statuses, deletions, limits, warnings.  | [`Listener`]                                |
//! | **Sources**       | Open a stream and read it line by line.                 | [`StreamFactory`], [`LineSource`]           |
//! | **Policies**      | Two backoff regimes, optional jitter.                   | [`BackoffPolicy`], [`JitterPolicy`]         |
//! | **Handle**        | Close, observe state and lifecycle events.              | [`StreamHandle`], [`ConnectionState`]       |
//! | **Errors**        | Typed faults with a stable label.                       | [`StreamFault`], [`DecodeError`]            |
//! | **Configuration** | Centralize stream settings.                             | [`Config`]                                  |
//!
//! ## Optional features
//! - `http` (default): [`HttpStreamFactory`] over `reqwest`.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use firehose::{Config, ConnectionRequest, HttpStreamFactory, Listener, Status};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Listener for Printer {
//!     async fn on_status(&self, status: &Status) {
//!         println!("{}", status.text);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let factory = Arc::new(HttpStreamFactory::new(&cfg)?);
//!     let request = ConnectionRequest::get("https://stream.example.com/sample.json");
//!
//!     let stream = firehose::open(factory, request, vec![Arc::new(Printer)], cfg);
//!     tokio::signal::ctrl_c().await?;
//!     stream.close();
//!     stream.closed().await;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod listeners;
pub mod message;
mod policies;
mod source;

// ---- Public re-exports ----

pub use config::Config;
pub use core::{CloseReason, ConnectionState, StreamBuilder, StreamHandle, open};
pub use error::{DecodeError, FaultKind, StreamFault};
pub use events::{Event, EventKind};
pub use listeners::Listener;
pub use message::{DeletionNotice, StallWarning, Status, StreamMessage, User};
pub use policies::{BackoffPolicy, BackoffState, Ceiling, Growth, JitterPolicy, Retry};
pub use source::{
    BoxLineSource, ConnectionRequest, FactoryFn, FactoryRef, LineSource, LineSourceCloser, Method,
    ReaderLineSource, StreamFactory,
};

// Optional: HTTP(S) factory over `reqwest`.
// Enable with: `--features http` (on by default)
#[cfg(feature = "http")]
pub use source::HttpStreamFactory;
