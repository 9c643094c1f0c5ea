//! # Typed stream payloads.
//!
//! `serde` models for the four recognized shapes and [`decode`], which turns a
//! classified line into a [`StreamMessage`]. Only the fields the runtime and
//! common listeners need are typed; the rest of a status object is kept in
//! [`Status::extra`].

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::message::classify::{Classification, classify};

/// Author of a status.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    /// Numeric user id.
    pub id: u64,
    /// Handle, without the `@`.
    pub screen_name: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A status (tweet-like) payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Status {
    /// Numeric status id.
    pub id: u64,
    /// Status text.
    #[serde(default)]
    pub text: String,
    /// Creation timestamp as sent by the endpoint.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Id of the status this one replies to.
    #[serde(default)]
    pub in_reply_to_status_id: Option<u64>,
    /// Id of the user this status replies to.
    #[serde(default)]
    pub in_reply_to_user_id: Option<u64>,
    /// Handle of the user this status replies to.
    #[serde(default)]
    pub in_reply_to_screen_name: Option<String>,
    /// Author.
    #[serde(default)]
    pub user: Option<User>,
    /// Remaining fields, untyped.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Status {
    /// Whether this status replies to another one.
    pub fn is_reply(&self) -> bool {
        self.in_reply_to_status_id.is_some()
    }
}

/// A request to delete a previously delivered status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeletionNotice {
    /// Id of the deleted status.
    #[serde(rename = "id")]
    pub status_id: u64,
    /// Id of the status author.
    pub user_id: u64,
}

/// Server warning that this client is falling behind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StallWarning {
    /// Warning code, e.g. `FALLING_BEHIND`.
    pub code: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// How full the server-side queue is, in percent.
    #[serde(default)]
    pub percent_full: u8,
}

/// A decoded stream message.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Status payload.
    Status(Box<Status>),
    /// Deletion notice.
    Delete(DeletionNotice),
    /// Number of matching statuses withheld by the track limit.
    TrackLimit(u64),
    /// Stall warning.
    Warning(StallWarning),
}

#[derive(Deserialize)]
struct DeleteEnvelope {
    delete: DeleteBody,
}

#[derive(Deserialize)]
struct DeleteBody {
    status: DeletionNotice,
}

#[derive(Deserialize)]
struct LimitEnvelope {
    limit: LimitBody,
}

#[derive(Deserialize)]
struct LimitBody {
    track: u64,
}

#[derive(Deserialize)]
struct WarningEnvelope {
    warning: StallWarning,
}

fn parse<'a, T: Deserialize<'a>>(shape: &'static str, line: &'a str) -> Result<T, DecodeError> {
    serde_json::from_str(line).map_err(|source| DecodeError::Malformed { shape, source })
}

/// Decodes a line already classified as `class`.
///
/// Returns `Ok(None)` for keep-alives and unrecognized lines.
pub fn decode(class: Classification, line: &str) -> Result<Option<StreamMessage>, DecodeError> {
    let shape = class.as_str();
    let msg = match class {
        Classification::KeepAlive | Classification::Unrecognized => return Ok(None),
        Classification::Status => StreamMessage::Status(Box::new(parse::<Status>(shape, line)?)),
        Classification::TrackLimit => {
            StreamMessage::TrackLimit(parse::<LimitEnvelope>(shape, line)?.limit.track)
        }
        Classification::Delete => {
            StreamMessage::Delete(parse::<DeleteEnvelope>(shape, line)?.delete.status)
        }
        Classification::Warning => {
            StreamMessage::Warning(parse::<WarningEnvelope>(shape, line)?.warning)
        }
    };
    Ok(Some(msg))
}

/// Classifies and decodes one raw line.
pub fn parse_line(line: &str) -> Result<Option<StreamMessage>, DecodeError> {
    decode(classify(line), line)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = r#"{"created_at":"Wed Aug 27 13:08:45 +0000 2008","id":42,"text":"hello","in_reply_to_status_id":null,"in_reply_to_user_id":null,"in_reply_to_screen_name":null,"user":{"id":7,"screen_name":"jack","name":"Jack"},"lang":"en"}"#;

    #[test]
    fn test_decodes_status() {
        let Some(StreamMessage::Status(status)) = parse_line(STATUS).unwrap() else {
            panic!("expected a status");
        };
        assert_eq!(status.id, 42);
        assert_eq!(status.text, "hello");
        assert!(!status.is_reply());
        assert_eq!(status.user.as_ref().map(|u| u.screen_name.as_str()), Some("jack"));
        assert_eq!(status.extra.get("lang"), Some(&Value::from("en")));
    }

    #[test]
    fn test_decodes_limit() {
        let msg = parse_line(r#"{"limit":{"track":5}}"#).unwrap();
        assert_eq!(msg, Some(StreamMessage::TrackLimit(5)));
    }

    #[test]
    fn test_decodes_delete() {
        let line = r#"{"delete":{"status":{"id":1234,"id_str":"1234","user_id":3,"user_id_str":"3"}}}"#;
        let msg = parse_line(line).unwrap();
        assert_eq!(
            msg,
            Some(StreamMessage::Delete(DeletionNotice {
                status_id: 1234,
                user_id: 3
            }))
        );
    }

    #[test]
    fn test_decodes_warning() {
        let line = r#"{"warning":{"code":"FALLING_BEHIND","message":"Your connection is falling behind","percent_full":60}}"#;
        let Some(StreamMessage::Warning(w)) = parse_line(line).unwrap() else {
            panic!("expected a warning");
        };
        assert_eq!(w.code, "FALLING_BEHIND");
        assert_eq!(w.percent_full, 60);
    }

    #[test]
    fn test_unrecognized_and_blank_yield_nothing() {
        assert_eq!(parse_line("BOGUS").unwrap(), None);
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn test_malformed_recognized_line_is_an_error() {
        let err = parse_line(r#"{"limit":{"track":"five"}}"#).unwrap_err();
        assert_eq!(err.as_label(), "decode_malformed");
        assert!(parse_line(r#"{"delete":"#).is_err());
        assert!(parse_line(r#"{"in_reply_to_status_id":null"#).is_err());
    }
}
