//! Push Notification Port

use async_trait::async_trait;

use crate::domain::entities::PushMessage;
use crate::domain::errors::DomainError;

/// Delivers a push message to a device
#[async_trait]
pub trait PushNotifier: Send + Sync {
    /// Returns the provider's message id
    async fn send(&self, message: &PushMessage) -> Result<String, DomainError>;
}
