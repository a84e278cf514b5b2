//! Stripe Routes
//!
//! PaymentIntent creation for the mobile/web checkout, and the webhook
//! Stripe calls when an intent settles.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;

use wheels::DomainError;

use crate::application::AmountSource;
use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{CreatePaymentIntentRequest, CreatePaymentIntentResponse, WebhookAck};
use crate::AppState;

const CREATE_FAILED: &str = "Failed to create payment intent";
const SIGNATURE_HEADER: &str = "stripe-signature";

/// Create a card PaymentIntent for an amount or a featured plan
///
/// The caller's `X-User-Id`, when sent, is stored on the intent so the
/// settlement notification reaches only that user.
#[utoipa::path(
    post,
    path = "/api/payments/stripe/create-payment-intent",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "PaymentIntent created", body = CreatePaymentIntentResponse),
        (status = 400, description = "Invalid amount or plan"),
        (status = 404, description = "Unknown plan"),
        (status = 500, description = "Failed to create payment intent"),
        (status = 503, description = "Stripe not configured")
    ),
    tag = "Payments"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    payload: Result<Json<CreatePaymentIntentRequest>, JsonRejection>,
) -> ApiResult<Json<CreatePaymentIntentResponse>> {
    let Json(payload) = payload?;
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::not_configured("Stripe"))?;

    let source = AmountSource::resolve(payload.amount, payload.plan_id.as_deref())
        .map_err(|e| ApiError::from_domain(e, CREATE_FAILED))?;

    let intent = stripe
        .create_payment_intent(
            &source,
            payload.order_id.as_deref(),
            payload.listing_id.as_deref(),
            user.as_ref().map(|CurrentUser(id)| id.as_str()),
        )
        .await
        .map_err(|e| ApiError::from_domain(e, CREATE_FAILED))?;

    let client_secret = intent.client_secret.ok_or_else(|| {
        tracing::error!(intent_id = %intent.id, "PaymentIntent has no client_secret");
        ApiError::Internal(CREATE_FAILED.to_string())
    })?;

    Ok(Json(CreatePaymentIntentResponse { client_secret }))
}

/// Receive Stripe events; authenticated by the `Stripe-Signature` header
#[utoipa::path(
    post,
    path = "/api/payments/stripe/webhook",
    request_body(content = String, description = "Raw event payload", content_type = "application/json"),
    responses(
        (status = 200, description = "Event accepted", body = WebhookAck),
        (status = 400, description = "Webhook Error: <reason>"),
        (status = 503, description = "Webhook secret not configured")
    ),
    tag = "Payments"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(webhook) = state.stripe_webhook.as_ref() else {
        return ApiError::not_configured("Stripe webhook").into_response();
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let event = match webhook.construct_event(&body, signature, Utc::now().timestamp()) {
        Ok(event) => event,
        Err(err) => {
            let reason = match err {
                DomainError::Signature(reason) => reason,
                other => other.to_string(),
            };
            tracing::warn!(reason = %reason, "Rejected Stripe webhook");
            return (StatusCode::BAD_REQUEST, format!("Webhook Error: {reason}")).into_response();
        }
    };

    tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Stripe webhook received");
    webhook.dispatch(&state.hub, &event);

    Json(WebhookAck { received: true }).into_response()
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/payments/stripe/create-payment-intent",
        post(create_payment_intent),
    )
}

/// Routes authenticated by their own signature rather than the API key
pub fn webhook_router() -> Router<AppState> {
    Router::new().route("/api/payments/stripe/webhook", post(stripe_webhook))
}
