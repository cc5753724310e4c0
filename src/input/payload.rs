//! Raw JSON request payloads

use crate::models::{EventSequence, LogEvent, ValidationError};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Wrapped { logs: Vec<LogEvent> },
    Bare(Vec<LogEvent>),
}

/// Decode a payload of the form `{"logs": [...]}` or a bare event array
///
/// Only the JSON shape is checked here; see [`EventSequence::new`] for the
/// sequence rules.
pub fn decode_payload(payload: &str) -> Result<Vec<LogEvent>, ValidationError> {
    match serde_json::from_str::<Payload>(payload) {
        Ok(Payload::Wrapped { logs }) => Ok(logs),
        Ok(Payload::Bare(events)) => Ok(events),
        Err(e) => Err(ValidationError::MalformedPayload(e.to_string())),
    }
}

/// Decode and validate a payload
pub fn parse_payload(payload: &str) -> Result<EventSequence, ValidationError> {
    EventSequence::new(decode_payload(payload)?)
}
