//! Bank Alfalah hosted checkout
//!
//! The gateway is driven in two signed steps: a handshake that yields an
//! `AuthToken`, then an SSO initialization that reuses the token.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::domain::errors::DomainError;
use crate::domain::services::signing::request_hash;
use crate::domain::value_objects::{Money, PaymentStatus};

/// Ordered `key -> value` parameters sent to the bank
pub type GatewayParams = BTreeMap<String, String>;

/// Card payments through the hosted page
pub const TRANSACTION_TYPE_CARD: &str = "3";

/// Merchant credentials for the bank gateway
#[derive(Clone)]
pub struct AlfalahMerchant {
    pub merchant_id: String,
    pub store_id: String,
    pub username: String,
    pub password: String,
    /// Shared secret; also the HMAC key for request hashes
    pub merchant_hash: String,
    pub channel_id: String,
    pub currency: String,
}

impl std::fmt::Debug for AlfalahMerchant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlfalahMerchant")
            .field("merchant_id", &self.merchant_id)
            .field("store_id", &self.store_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("merchant_hash", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("currency", &self.currency)
            .finish()
    }
}

impl AlfalahMerchant {
    /// Signed parameters for `POST /HS/HS/HS`
    pub fn handshake_params(&self, order_id: &str, return_url: &str) -> GatewayParams {
        let mut params = GatewayParams::new();
        params.insert("HS_ChannelId".into(), self.channel_id.clone());
        params.insert("HS_IsRedirectionRequest".into(), "1".into());
        params.insert("HS_MerchantId".into(), self.merchant_id.clone());
        params.insert("HS_StoreId".into(), self.store_id.clone());
        params.insert("HS_MerchantHash".into(), self.merchant_hash.clone());
        params.insert("HS_MerchantUsername".into(), self.username.clone());
        params.insert("HS_MerchantPassword".into(), self.password.clone());
        params.insert("HS_TransactionReferenceNumber".into(), order_id.to_string());
        params.insert("HS_ReturnURL".into(), return_url.to_string());

        let hash = request_hash(&params, &self.merchant_hash);
        params.insert("HS_RequestHash".into(), hash);
        params
    }

    /// Signed parameters for `POST /SSO/SSO/SSO`
    pub fn payment_params(&self, auth_token: &str, request: &PaymentInitRequest) -> GatewayParams {
        let mut params = GatewayParams::new();
        params.insert("AuthToken".into(), auth_token.to_string());
        params.insert("ChannelId".into(), self.channel_id.clone());
        params.insert("Currency".into(), self.currency.clone());
        params.insert("MerchantId".into(), self.merchant_id.clone());
        params.insert("StoreId".into(), self.store_id.clone());
        params.insert("MerchantHash".into(), self.merchant_hash.clone());
        params.insert("MerchantUsername".into(), self.username.clone());
        params.insert("MerchantPassword".into(), self.password.clone());
        params.insert("TransactionTypeId".into(), TRANSACTION_TYPE_CARD.into());
        params.insert(
            "TransactionReferenceNumber".into(),
            request.order_id.clone(),
        );
        params.insert("TransactionAmount".into(), request.amount.to_major_string());
        params.insert("ReturnURL".into(), request.return_url.clone());

        let hash = request_hash(&params, &self.merchant_hash);
        params.insert("RequestHash".into(), hash);
        params
    }
}

/// A validated request to start a hosted-checkout payment
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInitRequest {
    pub amount: Money,
    pub order_id: String,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub description: Option<String>,
    pub return_url: String,
}

impl PaymentInitRequest {
    pub fn new(
        amount: Money,
        order_id: impl Into<String>,
        return_url: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let order_id = order_id.into();
        let return_url = return_url.into();

        if order_id.trim().is_empty() {
            return Err(DomainError::Validation("orderId is required".into()));
        }
        if return_url.trim().is_empty() {
            return Err(DomainError::Validation("returnUrl is required".into()));
        }

        Ok(Self {
            amount,
            order_id,
            customer_email: None,
            customer_name: None,
            description: None,
            return_url,
        })
    }

    pub fn with_customer(mut self, name: Option<String>, email: Option<String>) -> Self {
        self.customer_name = name;
        self.customer_email = email;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// Handshake answer from `/HS/HS/HS`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandshakeResponse {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub success: bool,
    #[serde(rename = "AuthToken", default)]
    pub auth_token: Option<String>,
    #[serde(rename = "ReturnURL", default)]
    pub return_url: Option<String>,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: Option<String>,
}

impl HandshakeResponse {
    /// The auth token of a successful handshake, or the bank's refusal
    pub fn into_auth_token(self) -> Result<String, DomainError> {
        if !self.success {
            let message = self
                .error_message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Handshake failed".to_string());
            return Err(DomainError::gateway("alfalah", message));
        }

        self.auth_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DomainError::gateway("alfalah", "Handshake returned no AuthToken"))
    }
}

/// The bank answers `success` as a JSON bool or as `"true"`/`"false"`
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
        serde_json::Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    })
}

/// Order status as reported by the IPN endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderStatus {
    #[serde(rename = "TransactionStatus", default)]
    pub transaction_status: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "TransactionAmount", default)]
    pub transaction_amount: Option<serde_json::Value>,
    #[serde(rename = "TransactionReferenceNumber", default)]
    pub transaction_reference_number: Option<String>,
    #[serde(rename = "TransactionId", default)]
    pub transaction_id: Option<serde_json::Value>,
    #[serde(rename = "TransactionDateTime", default)]
    pub transaction_date_time: Option<String>,
}

impl OrderStatus {
    pub fn status(&self) -> PaymentStatus {
        self.transaction_status
            .as_deref()
            .map(PaymentStatus::from_bank_status)
            .unwrap_or_default()
    }

    pub fn into_verification(self) -> PaymentVerification {
        PaymentVerification {
            success: self.transaction_status.as_deref() == Some("Paid"),
            status: self.status(),
            message: self.description,
            transaction_details: TransactionDetails {
                amount: self.transaction_amount,
                status: self.transaction_status,
                order_id: self.transaction_reference_number,
                transaction_id: self.transaction_id,
                timestamp: self.transaction_date_time,
            },
        }
    }
}

/// Verification result returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerification {
    pub success: bool,
    pub status: PaymentStatus,
    pub message: Option<String>,
    pub transaction_details: TransactionDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
    #[schema(value_type = Option<Object>)]
    pub amount: Option<serde_json::Value>,
    pub status: Option<String>,
    pub order_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub transaction_id: Option<serde_json::Value>,
    pub timestamp: Option<String>,
}
