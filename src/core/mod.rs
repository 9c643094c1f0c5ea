//! Runtime core: supervision, dispatch and the stream handle.
//!
//! Internal modules:
//! - [`supervisor`]: connects, reads lines, applies backoff;
//! - [`queue`]: unbounded FIFO between the reader and the dispatcher;
//! - [`dispatcher`]: classifies, decodes and fans out to listeners;
//! - [`state`]: connection state machine;
//! - [`handle`]: user-facing handle;
//! - [`builder`]: wiring and spawning.

mod builder;
mod dispatcher;
mod handle;
mod queue;
mod state;
mod supervisor;

pub use builder::{StreamBuilder, open};
pub use handle::StreamHandle;
pub use state::{CloseReason, ConnectionState};
