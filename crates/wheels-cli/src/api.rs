//! Wheels API Client

use anyhow::{bail, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// API Client for Wheels
pub struct WheelsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    user_id: Option<String>,
}

// ============================================
// API Request/Response Types
// ============================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub duration_days: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlfalahPaymentRequest {
    pub amount: f64,
    pub order_id: String,
    pub return_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub success: bool,
    pub status: String,
    pub message: Option<String>,
    pub transaction_details: Value,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadSignature {
    pub signature: String,
    pub timestamp: String,
    pub folder: String,
    pub context: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUploadUrl {
    pub upload_url: String,
    pub expires_at: String,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub success: bool,
    pub message_ids: Vec<String>,
    pub success_count: usize,
    pub failure_count: usize,
    #[serde(default)]
    pub invalid_tokens: Vec<String>,
}

impl WheelsClient {
    /// Create a new API client
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            user_id: None,
        }
    }

    /// Act as this user on user-scoped routes
    pub fn with_user(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }

    /// Test connection with health check
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(resp.status().is_success())
    }

    pub async fn list_plans(&self) -> Result<Vec<Plan>> {
        self.execute(self.client.get(self.url("/api/payments/plans"))).await
    }

    /// Returns the bank's answer as-is
    pub async fn alfalah_initialize(&self, request: &AlfalahPaymentRequest) -> Result<Value> {
        self.execute(
            self.client
                .post(self.url("/api/payments/alfalah/initialize"))
                .json(request),
        )
        .await
    }

    pub async fn alfalah_verify(&self, order_id: &str) -> Result<Verification> {
        let path = format!(
            "/api/payments/alfalah/verify/{}",
            urlencoding::encode(order_id)
        );
        self.execute(self.client.get(self.url(&path))).await
    }

    pub async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntentResponse> {
        self.execute(
            self.client
                .post(self.url("/api/payments/stripe/create-payment-intent"))
                .json(request),
        )
        .await
    }

    pub async fn upload_signature(&self) -> Result<UploadSignature> {
        self.execute(self.client.post(self.url("/api/uploads/signature")))
            .await
    }

    pub async fn upload_url(&self, path: &str, content_type: &str) -> Result<SignedUploadUrl> {
        let body = serde_json::json!({ "path": path, "contentType": content_type });
        self.execute(self.client.post(self.url("/api/uploads/url")).json(&body))
            .await
    }

    pub async fn send_notification(
        &self,
        request: &NotificationRequest,
    ) -> Result<NotificationResponse> {
        self.execute(
            self.client
                .post(self.url("/api/notifications/send"))
                .json(request),
        )
        .await
    }

    /// Post a pre-signed Stripe event to the webhook endpoint
    pub async fn send_webhook(&self, payload: String, signature: &str) -> Result<Value> {
        self.execute(
            self.client
                .post(self.url("/api/payments/stripe/webhook"))
                .header("Stripe-Signature", signature)
                .header("Content-Type", "application/json")
                .body(payload),
        )
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let mut request = request;
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(user) = &self.user_id {
            request = request.header("X-User-Id", user);
        }

        let resp = request
            .send()
            .await
            .context("Failed to connect to Wheels API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("API error ({}): {}", status, error_message(&body));
        }

        resp.json().await.context("Failed to parse response")
    }
}

/// The `error` field of `{success: false, error}` bodies, or the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
