//! Router test helpers

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

use wheels::domain::services::gcs_signer::HmacKey;
use wheels::{BankGateway, PaymentIntentService, PushNotifier};

use crate::application::testing::{merchant, MockBankGateway, MockNotifier, MockPaymentIntents};
use crate::application::{
    AlfalahCheckout, NotificationService, RealtimeHub, StripeCheckout, StripeWebhook,
    UploadSigner,
};
use crate::config::{CloudinaryConfig, StorageConfig, StripeWebhookConfig};
use crate::{build_router, AppState};

pub const WEBHOOK_SECRET: &str = "whsec_router_test";

/// Mocks behind a test state, kept so tests can inspect calls
pub struct TestDeps {
    pub bank: Arc<MockBankGateway>,
    pub payments: Arc<MockPaymentIntents>,
    pub notifier: Arc<MockNotifier>,
}

impl Default for TestDeps {
    fn default() -> Self {
        Self {
            bank: Arc::new(MockBankGateway::accepting("token-abc").with_order_status("Paid")),
            payments: Arc::new(MockPaymentIntents::default()),
            notifier: Arc::new(MockNotifier::default()),
        }
    }
}

impl TestDeps {
    pub fn refusing_bank(message: &str) -> Self {
        Self {
            bank: Arc::new(MockBankGateway::refusing(Some(message))),
            ..Default::default()
        }
    }

    pub fn failing_stripe() -> Self {
        Self {
            payments: Arc::new(MockPaymentIntents::failing()),
            ..Default::default()
        }
    }
}

/// Every gateway configured, auth disabled
pub fn test_state(deps: &TestDeps) -> AppState {
    let hub = RealtimeHub::default();
    let bank: Arc<dyn BankGateway> = deps.bank.clone();
    let payments: Arc<dyn PaymentIntentService> = deps.payments.clone();
    let notifier: Arc<dyn PushNotifier> = deps.notifier.clone();

    AppState {
        api_key: None,
        checkout: Some(Arc::new(AlfalahCheckout::new(bank, merchant()))),
        stripe: Some(Arc::new(StripeCheckout::new(payments, "pkr"))),
        stripe_webhook: Some(Arc::new(StripeWebhook::new(StripeWebhookConfig {
            secret: WEBHOOK_SECRET.into(),
            tolerance_secs: 300,
        }))),
        uploads: UploadSigner::new(
            Some(CloudinaryConfig {
                api_secret: "cloud-secret".into(),
                folder: "listings".into(),
            }),
            Some(StorageConfig {
                bucket: "wheels-uploads".into(),
                key: HmacKey {
                    access_id: "GOOG1EXAMPLE".into(),
                    secret: "hmac-secret".into(),
                },
            }),
        ),
        notifications: Arc::new(NotificationService::new(Some(notifier), hub.clone())),
        hub,
    }
}

pub fn router_for(state: AppState) -> Router {
    build_router(state)
}

pub async fn send_json(
    state: AppState,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-user-id", "test-user")
        .body(match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    router_for(state).oneshot(request).await.unwrap()
}

pub async fn send_raw(
    state: AppState,
    uri: &str,
    body: String,
    stripe_signature: Option<&str>,
) -> Response {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(signature) = stripe_signature {
        builder = builder.header("stripe-signature", signature);
    }

    router_for(state)
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub async fn read_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn read_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
