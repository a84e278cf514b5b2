//! Firebase Cloud Messaging HTTP v1 notifier

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use wheels::{DomainError, PushMessage, PushNotifier};

use crate::config::FcmConfig;

pub struct FcmNotifier {
    client: Client,
    endpoint: String,
    access_token: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    message: FcmMessage<'a>,
}

#[derive(Serialize)]
struct FcmMessage<'a> {
    token: &'a str,
    notification: FcmNotification<'a>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    data: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    name: String,
}

impl FcmNotifier {
    pub fn new(config: &FcmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: format!(
                "{}/v1/projects/{}/messages:send",
                config.api_base.trim_end_matches('/'),
                config.project_id
            ),
            access_token: config.access_token.clone(),
        }
    }
}

#[async_trait]
impl PushNotifier for FcmNotifier {
    async fn send(&self, message: &PushMessage) -> Result<String, DomainError> {
        let request = SendRequest {
            message: FcmMessage {
                token: &message.token,
                notification: FcmNotification {
                    title: &message.title,
                    body: &message.body,
                },
                data: &message.data,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::ExternalService(format!("FCM request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            // FCM answers 404 UNREGISTERED for stale device tokens
            return Err(DomainError::not_found("FCM token", &message.token));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::ExternalService(format!(
                "FCM returned {status}: {body}"
            )));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Invalid FCM response: {e}")))?;

        tracing::debug!(message_id = %sent.name, "Push notification sent");
        Ok(sent.name)
    }
}
