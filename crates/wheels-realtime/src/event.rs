//! Incoming realtime events

use serde_json::Value;

/// A decoded frame, routed by its `type` field
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    ChatMessage(Value),
    Notification(Value),
    Other(Value),
}

impl RealtimeEvent {
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(match value.get("type").and_then(Value::as_str) {
            Some("chat_message") => Self::ChatMessage(value),
            Some("notification") => Self::Notification(value),
            _ => Self::Other(value),
        })
    }

    pub fn payload(&self) -> &Value {
        match self {
            Self::ChatMessage(v) | Self::Notification(v) | Self::Other(v) => v,
        }
    }
}
