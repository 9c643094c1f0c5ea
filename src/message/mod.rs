//! Stream messages: classification and decoding.
//!
//! ```text
//! RawLine ──► classify() ──► Classification ──► decode() ──► StreamMessage
//!                                   │                  │
//!                           Unrecognized/KeepAlive   DecodeError
//!                               (dropped)            (dropped, logged)
//! ```

mod classify;
mod payload;

pub use classify::{
    Classification, DELETE_PREFIX, LIMIT_PREFIX, STATUS_MARKER, WARNING_PREFIX, classify,
};
pub use payload::{
    DeletionNotice, StallWarning, Status, StreamMessage, User, decode, parse_line,
};
