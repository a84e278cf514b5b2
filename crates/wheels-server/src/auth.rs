//! Simple API Key Authentication (Bearer Token)
//!
//! Protected routes require `Authorization: Bearer <WHEELS_API_KEY>`.
//! User-scoped routes additionally read the caller from `X-User-Id`.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};

use wheels::DomainError;

use crate::error::ApiError;
use crate::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authentication middleware
/// Validates Bearer token against the API key
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let api_key = match state.api_key.as_deref() {
        Some(key) if !key.is_empty() => key,
        _ => {
            // No API key configured = auth disabled (for development)
            tracing::debug!("No API key configured, authentication disabled");
            return Ok(next.run(request).await);
        }
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if token == api_key => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Invalid API key attempted");
            Err(StatusCode::UNAUTHORIZED)
        }
        None if auth_header.is_some() => {
            tracing::warn!("Invalid Authorization header format");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// The end user on whose behalf the call is made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| CurrentUser(id.to_string()))
            .ok_or_else(|| {
                ApiError::from_domain(
                    DomainError::Unauthenticated(
                        "unauthenticated: the call requires a signed-in user".into(),
                    ),
                    "Unauthenticated",
                )
            })
    }
}
