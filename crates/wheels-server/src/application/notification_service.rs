//! Notification Service (Use Case)
//!
//! Keeps the `user -> device tokens` registry, fans pushes out to every
//! device and broadcasts chat messages to realtime subscribers.

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use wheels::{ChatMessageEvent, DomainError, PushMessage, PushNotifier};

use super::RealtimeHub;

/// Who a direct push is addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTarget {
    Tokens(Vec<String>),
    User(String),
}

impl PushTarget {
    /// Explicit tokens win over a user id; blanks and duplicates are dropped
    pub fn resolve(
        tokens: Vec<String>,
        token: Option<String>,
        user_id: Option<String>,
    ) -> Result<Self, DomainError> {
        let mut direct: Vec<String> = Vec::new();
        for token in tokens.into_iter().chain(token) {
            let token = token.trim().to_string();
            if !token.is_empty() && !direct.contains(&token) {
                direct.push(token);
            }
        }
        if !direct.is_empty() {
            return Ok(Self::Tokens(direct));
        }

        match user_id.filter(|u| !u.trim().is_empty()) {
            Some(user_id) => Ok(Self::User(user_id)),
            None => Err(DomainError::Validation(
                "tokens, token or userId is required".into(),
            )),
        }
    }
}

/// Per-device outcome of a push
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    pub message_ids: Vec<String>,
    /// Tokens the provider no longer knows; removed from the registry
    pub invalid_tokens: Vec<String>,
    /// Tokens that failed for any other reason
    pub failed_tokens: Vec<String>,
}

impl PushReport {
    pub fn success_count(&self) -> usize {
        self.message_ids.len()
    }

    pub fn failure_count(&self) -> usize {
        self.invalid_tokens.len() + self.failed_tokens.len()
    }

    pub fn delivered(&self) -> bool {
        !self.message_ids.is_empty()
    }
}

pub struct NotificationService {
    notifier: Option<Arc<dyn PushNotifier>>,
    tokens: RwLock<HashMap<String, BTreeSet<String>>>,
    hub: RealtimeHub,
}

impl NotificationService {
    pub fn new(notifier: Option<Arc<dyn PushNotifier>>, hub: RealtimeHub) -> Self {
        Self {
            notifier,
            tokens: RwLock::new(HashMap::new()),
            hub,
        }
    }

    /// Add a device token to a user's set
    pub async fn register_token(&self, user_id: &str, token: &str) -> Result<(), DomainError> {
        let (user_id, token) = (user_id.trim(), token.trim());
        if user_id.is_empty() {
            return Err(DomainError::Validation("userId is required".into()));
        }
        if token.is_empty() {
            return Err(DomainError::Validation("token is required".into()));
        }

        let added = self
            .tokens
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .insert(token.to_string());
        tracing::debug!(user_id = %user_id, added, "FCM token registered");
        Ok(())
    }

    /// Remove one device token from a user's set
    pub async fn unregister_token(&self, user_id: &str, token: &str) -> Result<(), DomainError> {
        let mut registry = self.tokens.write().await;
        let removed = match registry.get_mut(user_id) {
            Some(set) => {
                let removed = set.remove(token.trim());
                if set.is_empty() {
                    registry.remove(user_id);
                }
                removed
            }
            None => false,
        };

        if !removed {
            return Err(DomainError::not_found("FCM token for user", user_id));
        }
        tracing::debug!(user_id = %user_id, "FCM token removed");
        Ok(())
    }

    pub async fn tokens_for(&self, user_id: &str) -> Vec<String> {
        self.tokens
            .read()
            .await
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Push to explicit tokens or every device of a user
    pub async fn send(
        &self,
        target: PushTarget,
        title: &str,
        body: &str,
        data: BTreeMap<String, String>,
    ) -> Result<PushReport, DomainError> {
        let notifier = self.notifier()?;

        let tokens = match target {
            PushTarget::Tokens(tokens) => tokens,
            PushTarget::User(user_id) => {
                let tokens = self.tokens_for(&user_id).await;
                if tokens.is_empty() {
                    return Err(DomainError::not_found("FCM token for user", &user_id));
                }
                tokens
            }
        };

        let report = self
            .fan_out(notifier, &tokens, |token| {
                Ok(PushMessage::new(token, title, body)?.with_data(data.clone()))
            })
            .await?;

        tracing::info!(
            success_count = report.success_count(),
            failure_count = report.failure_count(),
            "📨 Notification sent"
        );
        Ok(report)
    }

    /// Fan a new chat message out; returns whether any device got a push
    pub async fn chat_message_created(&self, event: &ChatMessageEvent) -> Result<bool, DomainError> {
        if event.is_self_addressed() {
            tracing::debug!(chat_id = %event.chat_id, "Self-addressed message, not notifying");
            return Ok(false);
        }

        self.hub.publish(event.envelope(Utc::now()));

        let Some(notifier) = self.notifier.as_ref() else {
            tracing::debug!("Push not configured, realtime delivery only");
            return Ok(false);
        };
        let tokens = self.tokens_for(&event.recipient_id).await;
        if tokens.is_empty() {
            tracing::debug!(recipient_id = %event.recipient_id, "Recipient has no FCM tokens");
            return Ok(false);
        }

        let report = self
            .fan_out(notifier, &tokens, |token| event.push_for(token))
            .await?;

        tracing::info!(
            chat_id = %event.chat_id,
            success_count = report.success_count(),
            failure_count = report.failure_count(),
            "📨 Chat notification sent"
        );
        Ok(report.delivered())
    }

    /// Send one message per token and drop tokens the provider rejects
    ///
    /// Fails only when no device succeeded and at least one failure was
    /// something other than an unknown token.
    async fn fan_out<F>(
        &self,
        notifier: &Arc<dyn PushNotifier>,
        tokens: &[String],
        build: F,
    ) -> Result<PushReport, DomainError>
    where
        F: Fn(&str) -> Result<PushMessage, DomainError>,
    {
        let mut report = PushReport::default();
        let mut last_error = None;

        for token in tokens {
            let message = build(token)?;
            match notifier.send(&message).await {
                Ok(message_id) => report.message_ids.push(message_id),
                Err(DomainError::NotFound { .. }) => report.invalid_tokens.push(token.clone()),
                Err(e) => {
                    tracing::warn!(error = %e, "Push to device failed");
                    report.failed_tokens.push(token.clone());
                    last_error = Some(e);
                }
            }
        }

        if !report.invalid_tokens.is_empty() {
            self.forget_tokens(&report.invalid_tokens).await;
        }

        match last_error {
            Some(e) if !report.delivered() => Err(e),
            _ => Ok(report),
        }
    }

    async fn forget_tokens(&self, stale: &[String]) {
        let mut registry = self.tokens.write().await;
        registry.retain(|_, set| {
            set.retain(|token| !stale.contains(token));
            !set.is_empty()
        });
        tracing::warn!(count = stale.len(), "Dropped unregistered FCM tokens");
    }

    fn notifier(&self) -> Result<&Arc<dyn PushNotifier>, DomainError> {
        self.notifier
            .as_ref()
            .ok_or_else(|| DomainError::NotConfigured("Push notifications".into()))
    }
}
