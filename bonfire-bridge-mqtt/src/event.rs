//! Tag-update event model and the outbound projection.

use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use thiserror::Error;

/// Why an inbound payload was rejected.
///
/// A rejected payload is logged and dropped; the bridge never stops over
/// one bad event.
#[derive(Debug, Error)]
pub enum EventParseError {
    /// The payload was not valid JSON at all.
    #[error("payload is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// The payload was JSON but not a tag update (missing or mistyped
    /// field).
    #[error("payload is not a tag update: {0}")]
    Schema(#[source] serde_json::Error),
}

/// A tag value as carried on the bus: numeric or textual.
///
/// Numbers are kept as [`serde_json::Number`] so they reach the outbound
/// message exactly as published: integers stay integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Numeric value (integer or float).
    Number(serde_json::Number),

    /// Text value.
    Text(String),
}

impl From<i64> for TagValue {
    fn from(v: i64) -> Self {
        TagValue::Number(v.into())
    }
}

impl From<&str> for TagValue {
    fn from(v: &str) -> Self {
        TagValue::Text(v.to_string())
    }
}

/// One tag update as published on the `tag/update` channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagUpdateEvent {
    /// Tag name.
    pub name: String,

    /// Current tag value.
    pub value: TagValue,

    /// Unix epoch milliseconds when the value was sampled.
    pub value_ts: i64,
}

impl TagUpdateEvent {
    /// Parse an event payload, classifying failures.
    pub fn parse(payload: &str) -> Result<Self, EventParseError> {
        serde_json::from_str(payload).map_err(|e| match e.classify() {
            Category::Syntax | Category::Eof => EventParseError::Syntax(e),
            _ => EventParseError::Schema(e),
        })
    }
}

/// The message published to MQTT: a tag update under its outbound keys.
///
/// Field order matters here, it is the order the keys are serialized in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedMessage {
    /// Tag name, from the event's `name`.
    pub tag: String,

    /// Tag value, carried through unchanged.
    pub value: TagValue,

    /// Sample timestamp, from the event's `value_ts`.
    pub ts: i64,
}

impl From<TagUpdateEvent> for PublishedMessage {
    fn from(event: TagUpdateEvent) -> Self {
        Self {
            tag: event.name,
            value: event.value,
            ts: event.value_ts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_float_value() {
        let event = TagUpdateEvent::parse(r#"{"name":"temp1","value":21.5,"value_ts":1000}"#)
            .unwrap();
        assert_eq!(event.name, "temp1");
        assert_eq!(event.value, TagValue::Number(serde_json::Number::from_f64(21.5).unwrap()));
        assert_eq!(event.value_ts, 1000);
    }

    #[test]
    fn test_parse_integer_value() {
        let event =
            TagUpdateEvent::parse(r#"{"name":"count","value":1000,"value_ts":5}"#).unwrap();
        assert_eq!(event.value, TagValue::from(1000));
    }

    #[test]
    fn test_parse_text_value() {
        let event =
            TagUpdateEvent::parse(r#"{"name":"state","value":"running","value_ts":5}"#).unwrap();
        assert_eq!(event.value, TagValue::from("running"));
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let event = TagUpdateEvent::parse(
            r#"{"name":"t","value":1,"value_ts":2,"quality":"good"}"#,
        )
        .unwrap();
        assert_eq!(event.name, "t");
    }

    #[test]
    fn test_parse_classifies_invalid_json_as_syntax() {
        let err = TagUpdateEvent::parse("not json").unwrap_err();
        assert!(matches!(err, EventParseError::Syntax(_)));

        let err = TagUpdateEvent::parse(r#"{"name":"t""#).unwrap_err();
        assert!(matches!(err, EventParseError::Syntax(_)));
    }

    #[test]
    fn test_parse_classifies_bad_shape_as_schema() {
        // Missing fields.
        let err = TagUpdateEvent::parse(r#"{"name":"t"}"#).unwrap_err();
        assert!(matches!(err, EventParseError::Schema(_)));

        // Unsupported value type.
        let err = TagUpdateEvent::parse(r#"{"name":"t","value":true,"value_ts":1}"#).unwrap_err();
        assert!(matches!(err, EventParseError::Schema(_)));

        // Non-integer timestamp.
        let err =
            TagUpdateEvent::parse(r#"{"name":"t","value":1,"value_ts":"soon"}"#).unwrap_err();
        assert!(matches!(err, EventParseError::Schema(_)));
    }

    #[test]
    fn test_projection_renames_fields() {
        let event =
            TagUpdateEvent::parse(r#"{"name":"temp1","value":21.5,"value_ts":1000}"#).unwrap();
        let message = PublishedMessage::from(event);

        assert_eq!(message.tag, "temp1");
        assert_eq!(message.ts, 1000);
        assert_eq!(
            serde_json::to_string(&message).unwrap(),
            r#"{"tag":"temp1","value":21.5,"ts":1000}"#
        );
    }

    #[test]
    fn test_projection_keeps_integers_verbatim() {
        let event =
            TagUpdateEvent::parse(r#"{"name":"count","value":1000,"value_ts":5}"#).unwrap();
        let message = PublishedMessage::from(event);

        assert_eq!(
            serde_json::to_string(&message).unwrap(),
            r#"{"tag":"count","value":1000,"ts":5}"#
        );
    }

    #[test]
    fn test_parse_is_repeatable() {
        let payload = r#"{"name":"temp1","value":21.5,"value_ts":1000}"#;
        let first = TagUpdateEvent::parse(payload).unwrap();
        let second = TagUpdateEvent::parse(payload).unwrap();
        assert_eq!(first, second);
    }
}
