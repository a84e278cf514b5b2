//! Push notifications and realtime events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::errors::DomainError;

const PREVIEW_CHARS: usize = 100;

/// A push message addressed to one device token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    pub fn new(
        token: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let token = token.into();
        let title = title.into();
        if token.trim().is_empty() {
            return Err(DomainError::Validation("device token is required".into()));
        }
        if title.trim().is_empty() {
            return Err(DomainError::Validation("title is required".into()));
        }
        Ok(Self {
            token,
            title,
            body: body.into(),
            data: BTreeMap::new(),
        })
    }

    pub fn with_data(mut self, data: BTreeMap<String, String>) -> Self {
        self.data.extend(data);
        self
    }
}

/// A chat message written to `chats/{chatId}/messages/{messageId}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessageEvent {
    pub chat_id: String,
    pub message_id: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub recipient_id: String,
    pub text: String,
}

impl ChatMessageEvent {
    /// Nobody is notified about their own messages
    pub fn is_self_addressed(&self) -> bool {
        self.sender_id == self.recipient_id
    }

    pub fn preview(&self) -> String {
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }

    pub fn push_for(&self, token: &str) -> Result<PushMessage, DomainError> {
        let sender = self.sender_name.as_deref().unwrap_or(&self.sender_id);
        let mut data = BTreeMap::new();
        data.insert("type".to_string(), "chat_message".to_string());
        data.insert("chatId".to_string(), self.chat_id.clone());
        data.insert("messageId".to_string(), self.message_id.clone());

        Ok(PushMessage::new(token, format!("New message from {sender}"), self.preview())?
            .with_data(data))
    }

    pub fn envelope(&self, sent_at: DateTime<Utc>) -> RealtimeEnvelope {
        RealtimeEnvelope::ChatMessage {
            chat_id: self.chat_id.clone(),
            message_id: self.message_id.clone(),
            sender_id: self.sender_id.clone(),
            recipient_id: self.recipient_id.clone(),
            text: self.text.clone(),
            sent_at,
        }
    }
}

/// Frames pushed to WebSocket subscribers, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEnvelope {
    #[serde(rename_all = "camelCase")]
    ChatMessage {
        chat_id: String,
        message_id: String,
        sender_id: String,
        recipient_id: String,
        text: String,
        sent_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Notification {
        kind: String,
        title: String,
        body: String,
        #[serde(default)]
        data: serde_json::Value,
        /// Owning user; `None` is a broadcast to every subscriber
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recipient_id: Option<String>,
    },
}

impl RealtimeEnvelope {
    /// Chat messages reach their participants, addressed notifications
    /// their owner. Anonymous subscribers only see broadcasts.
    pub fn is_visible_to(&self, user_id: Option<&str>) -> bool {
        match self {
            Self::ChatMessage {
                sender_id,
                recipient_id,
                ..
            } => user_id.is_some_and(|user| user == sender_id || user == recipient_id),
            Self::Notification {
                recipient_id: Some(owner),
                ..
            } => user_id == Some(owner.as_str()),
            Self::Notification {
                recipient_id: None, ..
            } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(text: &str) -> ChatMessageEvent {
        ChatMessageEvent {
            chat_id: "chat-1".into(),
            message_id: "msg-1".into(),
            sender_id: "alice".into(),
            sender_name: Some("Alice".into()),
            recipient_id: "bob".into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "é".repeat(150);
        let preview = chat(&long).preview();
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("..."));
        assert_eq!(chat("short").preview(), "short");
    }

    #[test]
    fn test_push_for_recipient() {
        let push = chat("Is the car still available?").push_for("fcm-token").unwrap();
        assert_eq!(push.title, "New message from Alice");
        assert_eq!(push.data["chatId"], "chat-1");
        assert_eq!(push.data["type"], "chat_message");
    }

    #[test]
    fn test_push_requires_token() {
        assert!(chat("hi").push_for("").is_err());
    }

    fn notification(recipient_id: Option<&str>) -> RealtimeEnvelope {
        RealtimeEnvelope::Notification {
            kind: "payment_succeeded".into(),
            title: "Payment successful".into(),
            body: "ok".into(),
            data: serde_json::Value::Null,
            recipient_id: recipient_id.map(str::to_string),
        }
    }

    #[test]
    fn test_chat_is_visible_to_participants_only() {
        let event = chat("hi").envelope(Utc::now());
        assert!(event.is_visible_to(Some("alice")));
        assert!(event.is_visible_to(Some("bob")));
        assert!(!event.is_visible_to(Some("carol")));
        assert!(!event.is_visible_to(None));
    }

    #[test]
    fn test_addressed_notification_reaches_owner_only() {
        let owned = notification(Some("bob"));
        assert!(owned.is_visible_to(Some("bob")));
        assert!(!owned.is_visible_to(Some("carol")));
        assert!(!owned.is_visible_to(None));

        let broadcast = notification(None);
        assert!(broadcast.is_visible_to(None));
        assert!(broadcast.is_visible_to(Some("carol")));
    }

    #[test]
    fn test_broadcast_omits_recipient() {
        let json = serde_json::to_value(notification(None)).unwrap();
        assert_eq!(json["type"], "notification");
        assert!(json.get("recipientId").is_none());
        let json = serde_json::to_value(notification(Some("bob"))).unwrap();
        assert_eq!(json["recipientId"], "bob");
    }

    #[test]
    fn test_envelope_is_tagged() {
        let json = serde_json::to_value(chat("hi").envelope(Utc::now())).unwrap();
        assert_eq!(json["type"], "chat_message");
        assert_eq!(json["chatId"], "chat-1");
    }
}
