//! Payment Gateway Ports

use async_trait::async_trait;

use crate::domain::entities::{
    CreatePaymentIntent, GatewayParams, HandshakeResponse, OrderStatus, PaymentIntent,
};
use crate::domain::errors::DomainError;

/// Bank hosted-checkout gateway
///
/// Implementations only move already-signed parameters over the wire;
/// building and signing them is done by the domain.
///
/// # Example
///
/// ```rust,ignore
/// let params = merchant.handshake_params(&order_id, &return_url);
/// let token = gateway.handshake(&params).await?.into_auth_token()?;
/// ```
#[async_trait]
pub trait BankGateway: Send + Sync {
    /// `POST /HS/HS/HS`
    async fn handshake(&self, params: &GatewayParams) -> Result<HandshakeResponse, DomainError>;

    /// `POST /SSO/SSO/SSO`; the bank's answer is relayed verbatim
    async fn initiate(&self, params: &GatewayParams) -> Result<serde_json::Value, DomainError>;

    /// `GET /HS/api/IPN/OrderStatus/{merchant}/{store}/{order}`
    async fn order_status(&self, order_id: &str) -> Result<OrderStatus, DomainError>;
}

/// Card payments through Stripe PaymentIntents
#[async_trait]
pub trait PaymentIntentService: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, DomainError>;
}
