//! Runtime event model and notification decoding.
//!
//! # Responsibility
//! - Turn one single-key Runtime notification into a `{type, message}` event.
//!
//! # Invariants
//! - The first key of the notification is the event type.
//! - A notification without keys is a decode error. Callers that must stay
//!   one-to-one with Runtime notifications substitute `Event::empty()`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw notification as raised by the Runtime: `{ "<type>": <message> }`.
///
/// Key order follows emission order, so "first key" is well defined.
pub type RawNotification = Map<String, Value>;

/// Normalized event delivered to the host observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Serialized as `type` to match the host-facing shape.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// Errors from notification decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDecodeError {
    /// Notification object has no keys.
    Empty,
}

impl Display for EventDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "runtime notification has no event type"),
        }
    }
}

impl Error for EventDecodeError {}

impl Event {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Event with no type and no message, standing in for a notification
    /// that carried no keys.
    pub fn empty() -> Self {
        Self::new("", "")
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_empty() && self.message.is_empty()
    }

    /// Decodes one Runtime notification.
    ///
    /// String values are taken verbatim; any other JSON value becomes its
    /// JSON text. Keys after the first are ignored.
    ///
    /// # Errors
    /// - `EventDecodeError::Empty` when the notification has no keys.
    pub fn decode(raw: &RawNotification) -> Result<Self, EventDecodeError> {
        let (kind, value) = raw.iter().next().ok_or(EventDecodeError::Empty)?;
        let message = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Ok(Self::new(kind.as_str(), message))
    }
}

impl TryFrom<&RawNotification> for Event {
    type Error = EventDecodeError;

    fn try_from(value: &RawNotification) -> Result<Self, Self::Error> {
        Self::decode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Event, EventDecodeError, RawNotification};
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawNotification {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn decodes_single_key_notification() {
        let event = Event::decode(&raw(json!({"build": "ok"}))).expect("decode");
        assert_eq!(event, Event::new("build", "ok"));
    }

    #[test]
    fn first_key_wins_on_multi_key_notification() {
        let event = Event::decode(&raw(json!({"warn": "first", "info": "second"})))
            .expect("decode");
        assert_eq!(event.kind, "warn");
        assert_eq!(event.message, "first");
    }

    #[test]
    fn non_string_values_become_json_text() {
        let event = Event::decode(&raw(json!({"gas": 42}))).expect("decode");
        assert_eq!(event.message, "42");
    }

    #[test]
    fn empty_notification_is_rejected() {
        let err = Event::decode(&RawNotification::new()).expect_err("empty must fail");
        assert_eq!(err, EventDecodeError::Empty);
    }

    #[test]
    fn serializes_kind_as_type() {
        let value = serde_json::to_value(Event::new("log", "hello")).expect("serialize");
        assert_eq!(value, json!({"type": "log", "message": "hello"}));
    }
}
