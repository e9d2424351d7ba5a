//! # Events and Topics

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Topic a subscription or event is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Create a topic from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The topic as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Topic {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A notification payload delivered to subscribers.
///
/// Created and consumed synchronously within one `notify` call; the stream
/// surface receives its own clone.
#[derive(Debug, Clone, Serialize)]
pub struct Event<E> {
    /// Unique event id.
    pub id: Uuid,

    /// Topic this event was emitted on.
    pub topic: Topic,

    /// Emitted state snapshot.
    pub payload: E,

    /// Emission timestamp, unix milliseconds.
    pub emitted_at_ms: u64,
}

impl<E> Event<E> {
    pub(crate) fn new(topic: Topic, payload: E) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic,
            payload,
            emitted_at_ms: current_timestamp_ms(),
        }
    }
}

/// Current unix timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}
