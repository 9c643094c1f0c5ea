//! # Line classification by structural sniffing.
//!
//! Decides which payload shape a raw line carries **before** parsing it, using
//! cheap substring/prefix checks. Priority order:
//!
//! ```text
//! contains "in_reply_to_status_id"  → Status
//! starts with {"limit":             → TrackLimit
//! starts with {"delete":            → Delete
//! starts with {"warning":           → Warning
//! anything else                     → Unrecognized (dropped)
//! ```
//!
//! The status check is a substring search, not a structural one: every status
//! object the endpoint emits carries the reply field (null when unset).

/// Substring that marks a status (tweet-like) payload.
pub const STATUS_MARKER: &str = "\"in_reply_to_status_id\"";
/// Prefix of a track-limit notice.
pub const LIMIT_PREFIX: &str = "{\"limit\":";
/// Prefix of a deletion notice.
pub const DELETE_PREFIX: &str = "{\"delete\":";
/// Prefix of a stall warning.
pub const WARNING_PREFIX: &str = "{\"warning\":";

/// Payload shape of a raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Blank keep-alive line.
    KeepAlive,
    /// Status (tweet-like) payload.
    Status,
    /// Track-limit notice.
    TrackLimit,
    /// Deletion notice.
    Delete,
    /// Stall warning.
    Warning,
    /// Unknown shape.
    Unrecognized,
}

impl Classification {
    /// Short name of the shape, for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::KeepAlive => "keep_alive",
            Classification::Status => "status",
            Classification::TrackLimit => "limit",
            Classification::Delete => "delete",
            Classification::Warning => "warning",
            Classification::Unrecognized => "unrecognized",
        }
    }
}

/// Classifies one raw line.
///
/// # Example
/// ```
/// use firehose::message::{classify, Classification};
///
/// assert_eq!(classify(r#"{"limit":{"track":5}}"#), Classification::TrackLimit);
/// assert_eq!(classify("BOGUS"), Classification::Unrecognized);
/// assert_eq!(classify("\r"), Classification::KeepAlive);
/// ```
pub fn classify(line: &str) -> Classification {
    let line = line.trim_start();
    if line.trim_end().is_empty() {
        Classification::KeepAlive
    } else if line.contains(STATUS_MARKER) {
        Classification::Status
    } else if line.starts_with(LIMIT_PREFIX) {
        Classification::TrackLimit
    } else if line.starts_with(DELETE_PREFIX) {
        Classification::Delete
    } else if line.starts_with(WARNING_PREFIX) {
        Classification::Warning
    } else {
        Classification::Unrecognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(classify(r#"{"limit":{"track":1}}"#), Classification::TrackLimit);
        assert_eq!(
            classify(r#"{"delete":{"status":{"id":1,"user_id":2}}}"#),
            Classification::Delete
        );
        assert_eq!(
            classify(r#"{"warning":{"code":"FALLING_BEHIND","message":"m","percent_full":60}}"#),
            Classification::Warning
        );
    }

    #[test]
    fn test_reply_marker_wins_over_prefix() {
        let line = r#"{"limit":{"track":1},"in_reply_to_status_id":null}"#;
        assert_eq!(classify(line), Classification::Status);
    }

    #[test]
    fn test_status_marker_anywhere() {
        let line = r#"{"id":1,"text":"hi","in_reply_to_status_id":7}"#;
        assert_eq!(classify(line), Classification::Status);
    }

    #[test]
    fn test_blank_and_unknown() {
        assert_eq!(classify(""), Classification::KeepAlive);
        assert_eq!(classify("   "), Classification::KeepAlive);
        assert_eq!(classify(r#"{"friends":[1,2,3]}"#), Classification::Unrecognized);
        assert_eq!(classify("BOGUS"), Classification::Unrecognized);
    }

    #[test]
    fn test_leading_whitespace_is_ignored() {
        assert_eq!(classify(r#"  {"limit":{"track":1}}"#), Classification::TrackLimit);
    }
}
