//! Stripe HTTP Client
//!
//! Creates PaymentIntents through Stripe's form-encoded REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use wheels::{CreatePaymentIntent, DomainError, PaymentIntent, PaymentIntentService};

use crate::config::StripeConfig;

const STRIPE_API_VERSION: &str = "2023-10-16";

pub struct HttpStripeClient {
    client: Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl HttpStripeClient {
    pub fn new(config: &StripeConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        }
    }
}

#[async_trait]
impl PaymentIntentService for HttpStripeClient {
    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, DomainError> {
        let url = format!("{}/v1/payment_intents", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .form(&request.form_fields())
            .send()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Stripe request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .map(|b| {
                    format!(
                        "{}: {}",
                        b.error.kind.unwrap_or_else(|| "api_error".into()),
                        b.error.message.unwrap_or_default()
                    )
                })
                .unwrap_or(body);
            return Err(DomainError::ExternalService(format!(
                "Stripe returned {status}: {detail}"
            )));
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| DomainError::ExternalService(format!("Invalid Stripe response: {e}")))?;

        tracing::info!(intent_id = %intent.id, amount = intent.amount, "💳 PaymentIntent created");

        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use wheels::Money;

    fn client(api_base: String) -> HttpStripeClient {
        HttpStripeClient::new(&StripeConfig {
            secret_key: "sk_test_123".into(),
            api_base,
            currency: "pkr".into(),
        })
    }

    #[tokio::test]
    async fn test_create_payment_intent_posts_form() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/payment_intents")
                    .header("authorization", "Bearer sk_test_123")
                    .body_contains("amount=50000")
                    .body_contains("currency=pkr")
                    .body_contains("payment_method_types%5B%5D=card");
                then.status(200).json_body(serde_json::json!({
                    "id": "pi_123",
                    "client_secret": "pi_123_secret_abc",
                    "amount": 50000,
                    "currency": "pkr",
                    "status": "requires_payment_method"
                }));
            })
            .await;

        let intent = client(server.base_url())
            .create_payment_intent(&CreatePaymentIntent::card(
                Money::from_major(500.0).unwrap(),
                "pkr",
            ))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_abc"));
    }

    #[tokio::test]
    async fn test_stripe_error_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/payment_intents");
                then.status(402).json_body(serde_json::json!({
                    "error": {"type": "card_error", "message": "Amount too small"}
                }));
            })
            .await;

        let err = client(server.base_url())
            .create_payment_intent(&CreatePaymentIntent::card(Money::from_minor(1), "pkr"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("card_error: Amount too small"));
    }
}
