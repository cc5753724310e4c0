use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A single structured log event as submitted for scoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub component: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub level: String,
}

impl LogEvent {
    /// Event with only a message; component and level are empty
    pub fn new(message: impl Into<String>) -> Self {
        LogEvent {
            message: message.into(),
            component: String::new(),
            level: String::new(),
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        component: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        LogEvent {
            message: message.into(),
            component: component.into(),
            level: level.into(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reasons a request is refused before it is admitted for scoring
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("event sequence must contain at least one event")]
    EmptySequence,

    #[error("event {index} has an empty message")]
    EmptyMessage { index: usize },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Ordered, non-empty batch of log events
///
/// Arrival order is preserved. Holding an `EventSequence` means the batch
/// already passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSequence {
    events: Vec<LogEvent>,
}

impl EventSequence {
    pub fn new(events: Vec<LogEvent>) -> Result<Self, ValidationError> {
        if events.is_empty() {
            return Err(ValidationError::EmptySequence);
        }
        if let Some(index) = events.iter().position(|e| e.message.is_empty()) {
            return Err(ValidationError::EmptyMessage { index });
        }
        Ok(EventSequence { events })
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
