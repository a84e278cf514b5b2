//! Upload Routes
//!
//! Hands signed upload credentials to signed-in users; files never pass
//! through this server.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;

use wheels::{SignedUploadUrl, UploadSignature};

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::models::UploadUrlRequest;
use crate::AppState;

/// Cloudinary upload signature for the caller
#[utoipa::path(
    post,
    path = "/api/uploads/signature",
    params(
        ("X-User-Id" = String, Header, description = "Signed-in user")
    ),
    responses(
        (status = 200, description = "Signed upload parameters", body = UploadSignature),
        (status = 401, description = "No signed-in user"),
        (status = 503, description = "Cloudinary not configured")
    ),
    tag = "Uploads"
)]
pub async fn upload_signature(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> ApiResult<Json<UploadSignature>> {
    let signature = state
        .uploads
        .signature(&user_id, Utc::now())
        .map_err(|e| ApiError::from_domain(e, "Unable to sign upload"))?;

    Ok(Json(signature))
}

/// Pre-signed Cloud Storage `PUT` URL, valid for 15 minutes
#[utoipa::path(
    post,
    path = "/api/uploads/url",
    params(
        ("X-User-Id" = String, Header, description = "Signed-in user")
    ),
    request_body = UploadUrlRequest,
    responses(
        (status = 200, description = "Signed URL", body = SignedUploadUrl),
        (status = 400, description = "Path and content type are required"),
        (status = 401, description = "No signed-in user"),
        (status = 503, description = "Storage not configured")
    ),
    tag = "Uploads"
)]
pub async fn upload_url(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<UploadUrlRequest>, JsonRejection>,
) -> ApiResult<Json<SignedUploadUrl>> {
    let Json(payload) = payload?;

    let signed = state
        .uploads
        .upload_url(&user_id, &payload.path, &payload.content_type, Utc::now())
        .map_err(|e| ApiError::from_domain(e, "Unable to generate signed URL"))?;

    Ok(Json(signed))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/uploads/signature", post(upload_signature))
        .route("/api/uploads/url", post(upload_url))
}
