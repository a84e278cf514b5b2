//! HTTP error responses
//!
//! Every failure leaves the API as `{"success": false, "error": "..."}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use wheels::DomainError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_configured(service: &str) -> Self {
        ApiError::NotConfigured(service.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a domain error; internal causes are logged and replaced by
    /// `public_message`
    pub fn from_domain(err: DomainError, public_message: &str) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::Signature(msg) => ApiError::BadRequest(msg),
            DomainError::Gateway { gateway, message } => {
                tracing::warn!(gateway = %gateway, error = %message, "Gateway refused request");
                ApiError::BadRequest(message)
            }
            DomainError::Unauthenticated(msg) => ApiError::Unauthorized(msg),
            err @ DomainError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DomainError::NotConfigured(what) => {
                tracing::warn!(service = %what, "Service not configured");
                ApiError::NotConfigured(what)
            }
            DomainError::ExternalService(cause) => {
                tracing::error!(error = %cause, "{}", public_message);
                ApiError::Internal(public_message.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
