//! Reconnect policies.
//!
//! This module groups the knobs that control **how long** the supervisor waits
//! before reopening a stream.
//!
//! ## Contents
//! - [`BackoffPolicy`] how delays evolve (first / growth / max / ceiling + jitter)
//! - [`BackoffState`]  consecutive-failure counter owned by the supervisor
//! - [`JitterPolicy`]  randomization strategy to avoid thundering herd
//!
//! ## Quick wiring
//! ```text
//! Config { refused_backoff, network_backoff }
//!      └─► core::supervisor picks the policy by FaultKind:
//!           - Refused (status code)  → exponential, gives up past ceiling
//!           - Network (no status)    → linear, clamped, retries forever
//! ```

mod backoff;
mod jitter;

pub use backoff::{BackoffPolicy, BackoffState, Ceiling, Growth, Retry};
pub use jitter::JitterPolicy;
