//! Stream event types and their wire framing.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The named event types pushed to stream subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Subscription confirmation, sent once per connection.
    Connected,
    /// A workflow entered a new pipeline stage.
    StageUpdate,
    /// A stage finished its work unit and produced a payload.
    StageData,
    /// Per-section progress during content generation.
    ContentProgress,
    /// A workflow pipeline failed.
    Error,
    /// Periodic liveness ping with the active connection count.
    Heartbeat,
    /// Server-initiated shutdown notice.
    Disconnect,
}

impl EventKind {
    /// Wire name of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::StageUpdate => "stage_update",
            Self::StageData => "stage_data",
            Self::ContentProgress => "content_progress",
            Self::Error => "error",
            Self::Heartbeat => "heartbeat",
            Self::Disconnect => "disconnect",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event delivered over a subscriber's push channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEvent {
    /// The event type.
    #[serde(rename = "event")]
    pub kind: EventKind,
    /// JSON payload.
    pub data: serde_json::Value,
}

impl StreamEvent {
    /// Creates a new event with the given payload.
    pub fn new(kind: EventKind, data: serde_json::Value) -> Self {
        Self { kind, data }
    }

    /// Encodes the event in server-sent-event framing: an event-type
    /// line, a data line carrying the JSON payload, and a blank line
    /// terminator.
    pub fn to_sse_frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.kind, self.data)
    }

    /// ISO 8601 timestamp used in event payloads.
    pub fn timestamp() -> String {
        Utc::now().to_rfc3339()
    }
}
