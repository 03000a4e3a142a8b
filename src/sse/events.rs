//! Change-stream event definitions.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Event types emitted by watch and listen.
///
/// The first five are sent by the server. The rest are synthesized locally
/// when a stream terminates and are never sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    /// New data was written at or below the watched location.
    Put,
    /// Data at or below the watched location was updated.
    Patch,
    /// Periodic heartbeat.
    KeepAlive,
    /// Security rules no longer allow reading the watched location.
    Cancel,
    /// The auth token was revoked or expired.
    AuthRevoked,
    /// The connection ended.
    Closed,
    /// A transport error or an unexpected frame terminator ended the stream.
    UnknownError,
    /// A frame did not start with an `event: ` line.
    MalformedEventError,
    /// A frame's second line did not start with `data: `.
    MalformedDataError,
    /// An event name this client does not know about.
    Other(String),
}

impl EventType {
    /// Wire name of the event type.
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Put => "put",
            EventType::Patch => "patch",
            EventType::KeepAlive => "keep-alive",
            EventType::Cancel => "cancel",
            EventType::AuthRevoked => "auth_revoked",
            EventType::Closed => "closed",
            EventType::UnknownError => "unknown_error",
            EventType::MalformedEventError => "malformed_event_error",
            EventType::MalformedDataError => "malformed_data_error",
            EventType::Other(name) => name,
        }
    }

    /// Whether this type is produced locally to report stream termination.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventType::Closed
                | EventType::UnknownError
                | EventType::MalformedEventError
                | EventType::MalformedDataError
        )
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        match name {
            "put" => EventType::Put,
            "patch" => EventType::Patch,
            "keep-alive" => EventType::KeepAlive,
            "cancel" => EventType::Cancel,
            "auth_revoked" => EventType::AuthRevoked,
            "closed" => EventType::Closed,
            "unknown_error" => EventType::UnknownError,
            "malformed_event_error" => EventType::MalformedEventError,
            "malformed_data_error" => EventType::MalformedDataError,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single change-stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_type: EventType,
    /// JSON document for server events, a diagnostic for synthesized ones.
    pub data: Bytes,
}

impl Event {
    pub fn new(event_type: EventType, data: impl Into<Bytes>) -> Self {
        Self {
            event_type,
            data: data.into(),
        }
    }

    /// Whether this event reports the end of its stream.
    pub fn is_terminal(&self) -> bool {
        self.event_type.is_terminal()
    }

    /// Payload as text, with invalid UTF-8 replaced.
    pub fn data_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Decode the payload as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.data)
    }

    /// Decode a `put` or `patch` payload.
    pub fn payload(&self) -> Result<ChangePayload, serde_json::Error> {
        self.json()
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.event_type, self.data_str())
    }
}

/// Body of `put` and `patch` events.
///
/// `path` is relative to the watched location. For `patch`, `data` is an
/// object whose keys are children of `path` to merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePayload {
    pub path: String,
    pub data: serde_json::Value,
}
