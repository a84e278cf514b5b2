//! Notification DTOs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use wheels::ChatMessageEvent;

use crate::application::PushReport;

/// Direct push; `tokens`/`token` win over `userId`
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    #[serde(default)]
    pub tokens: Vec<String>,
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationResponse {
    /// At least one device accepted the message
    pub success: bool,
    pub message_ids: Vec<String>,
    pub success_count: usize,
    pub failure_count: usize,
    /// Tokens the provider rejected as unregistered
    pub invalid_tokens: Vec<String>,
}

impl From<PushReport> for SendNotificationResponse {
    fn from(report: PushReport) -> Self {
        Self {
            success: report.delivered(),
            success_count: report.success_count(),
            failure_count: report.failure_count(),
            message_ids: report.message_ids,
            invalid_tokens: report.invalid_tokens,
        }
    }
}

/// One device token of a user
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeviceTokenRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

/// A chat message that was just written
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageNotifyRequest {
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub recipient_id: String,
    #[serde(default)]
    pub text: String,
}

impl ChatMessageNotifyRequest {
    pub fn into_event(self, chat_id: String, message_id: String) -> ChatMessageEvent {
        ChatMessageEvent {
            chat_id,
            message_id,
            sender_id: self.sender_id,
            sender_name: self.sender_name.filter(|n| !n.trim().is_empty()),
            recipient_id: self.recipient_id,
            text: self.text,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatNotifyResponse {
    pub delivered: bool,
}
