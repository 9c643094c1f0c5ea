//! Stream listeners and their fan-out.
//!
//! ```text
//! Dispatcher ── emit(StreamMessage) ──► ListenerSet
//!                                          ├──► worker ──► Listener::on_status / on_delete / ...
//!                                          └──► worker ──► ...
//! ```
//!
//! ## Implementing a listener
//! ```no_run
//! use async_trait::async_trait;
//! use firehose::{Listener, Status};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Listener for Printer {
//!     async fn on_status(&self, status: &Status) {
//!         println!("{}: {}", status.id, status.text);
//!     }
//!     fn name(&self) -> &'static str { "printer" }
//! }
//! ```

mod listener;
mod set;

pub use listener::Listener;
pub(crate) use set::ListenerSet;
