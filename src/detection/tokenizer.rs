//! Event tokenization
//!
//! Each event becomes one token: a `component:level` prefix followed by the
//! normalized message. A whole sequence becomes one text block with one
//! token per line, in arrival order.

use crate::detection::normalizer::normalize;
use crate::models::{EventSequence, LogEvent};

/// Joins the component and level inside the prefix
pub const PREFIX_SEPARATOR: &str = ":";
/// Separates the prefix from the normalized message
pub const MESSAGE_DELIMITER: &str = " ";
/// Separates consecutive event tokens in a text block
pub const EVENT_DELIMITER: &str = "\n";

/// Component names such as `dfs.DataNode$PacketResponder` keep only the
/// part before the first `$`.
fn component_prefix(component: &str) -> String {
    component
        .split('$')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Build the token for one event
pub fn tokenize_event(event: &LogEvent) -> String {
    let mut token = component_prefix(&event.component);
    token.push_str(PREFIX_SEPARATOR);
    token.push_str(&event.level.trim().to_lowercase());
    token.push_str(MESSAGE_DELIMITER);
    token.push_str(&normalize(&event.message));
    token
}

/// Tokenize every event and join the tokens into one text block
pub fn tokenize_sequence(sequence: &EventSequence) -> String {
    sequence
        .events()
        .iter()
        .map(tokenize_event)
        .collect::<Vec<_>>()
        .join(EVENT_DELIMITER)
}
