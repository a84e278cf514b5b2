//! Bank Alfalah Routes
//!
//! Handshake + SSO initialization, and order status verification.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};

use wheels::PaymentVerification;

use crate::error::{ApiError, ApiResult};
use crate::models::InitializePaymentRequest;
use crate::{AppCheckout, AppState};

const INITIALIZE_FAILED: &str = "Failed to initialize payment";
const VERIFY_FAILED: &str = "Failed to verify payment";

fn checkout(state: &AppState) -> ApiResult<&AppCheckout> {
    state
        .checkout
        .as_deref()
        .ok_or_else(|| ApiError::not_configured("Bank Alfalah gateway"))
}

/// Start a hosted-checkout payment
///
/// Relays the bank's SSO answer verbatim.
#[utoipa::path(
    post,
    path = "/api/payments/alfalah/initialize",
    request_body = InitializePaymentRequest,
    responses(
        (status = 200, description = "Bank response relayed verbatim"),
        (status = 400, description = "Invalid request or handshake refused"),
        (status = 500, description = "Failed to initialize payment"),
        (status = 503, description = "Gateway not configured")
    ),
    tag = "Payments"
)]
pub async fn initialize_payment(
    State(state): State<AppState>,
    payload: Result<Json<InitializePaymentRequest>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Json(payload) = payload?;
    let request = payload
        .into_domain()
        .map_err(|e| ApiError::from_domain(e, INITIALIZE_FAILED))?;

    let response = checkout(&state)?
        .initialize(&request)
        .await
        .map_err(|e| ApiError::from_domain(e, INITIALIZE_FAILED))?;

    Ok(Json(response))
}

/// Look up the bank's status for an order
#[utoipa::path(
    get,
    path = "/api/payments/alfalah/verify/{order_id}",
    params(
        ("order_id" = String, Path, description = "Transaction reference number")
    ),
    responses(
        (status = 200, description = "Verification result", body = PaymentVerification),
        (status = 500, description = "Failed to verify payment"),
        (status = 503, description = "Gateway not configured")
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<PaymentVerification>> {
    let verification = checkout(&state)?
        .verify(&order_id)
        .await
        .map_err(|e| ApiError::from_domain(e, VERIFY_FAILED))?;

    Ok(Json(verification))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments/alfalah/initialize", post(initialize_payment))
        .route("/api/payments/alfalah/verify/:order_id", get(verify_payment))
}
