//! Notification Routes
//!
//! Direct pushes, the device token registry, and the chat message trigger.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{post, put},
    Json, Router,
};

use crate::application::PushTarget;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    ChatMessageNotifyRequest, ChatNotifyResponse, DeviceTokenRequest, SendNotificationRequest,
    SendNotificationResponse, SuccessResponse,
};
use crate::AppState;

/// Push a notification to device tokens or every device of a registered user
#[utoipa::path(
    post,
    path = "/api/notifications/send",
    request_body = SendNotificationRequest,
    responses(
        (status = 200, description = "Notification sent", body = SendNotificationResponse),
        (status = 400, description = "Missing target or title"),
        (status = 404, description = "User has no registered tokens"),
        (status = 500, description = "Every device failed"),
        (status = 503, description = "Push not configured")
    ),
    tag = "Notifications"
)]
pub async fn send_notification(
    State(state): State<AppState>,
    payload: Result<Json<SendNotificationRequest>, JsonRejection>,
) -> ApiResult<Json<SendNotificationResponse>> {
    let Json(payload) = payload?;
    let failed = |e| ApiError::from_domain(e, "Failed to send notification");

    let target =
        PushTarget::resolve(payload.tokens, payload.token, payload.user_id).map_err(failed)?;
    let report = state
        .notifications
        .send(target, &payload.title, &payload.body, payload.data)
        .await
        .map_err(failed)?;

    Ok(Json(report.into()))
}

/// Add an FCM device token to a user
#[utoipa::path(
    put,
    path = "/api/users/{user_id}/fcm-token",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    request_body = DeviceTokenRequest,
    responses(
        (status = 200, description = "Token stored", body = SuccessResponse),
        (status = 400, description = "Missing token")
    ),
    tag = "Notifications"
)]
pub async fn register_token(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<DeviceTokenRequest>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    let Json(payload) = payload?;

    state
        .notifications
        .register_token(&user_id, &payload.token)
        .await
        .map_err(|e| ApiError::from_domain(e, "Failed to store token"))?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Remove one FCM device token from a user
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/fcm-token",
    params(
        ("user_id" = String, Path, description = "User ID")
    ),
    request_body = DeviceTokenRequest,
    responses(
        (status = 200, description = "Token removed", body = SuccessResponse),
        (status = 404, description = "Token not registered for this user")
    ),
    tag = "Notifications"
)]
pub async fn unregister_token(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<DeviceTokenRequest>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    let Json(payload) = payload?;

    state
        .notifications
        .unregister_token(&user_id, &payload.token)
        .await
        .map_err(|e| ApiError::from_domain(e, "Failed to remove token"))?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Fan out a chat message that was just written
#[utoipa::path(
    post,
    path = "/api/chats/{chat_id}/messages/{message_id}/notify",
    params(
        ("chat_id" = String, Path, description = "Chat ID"),
        ("message_id" = String, Path, description = "Message ID")
    ),
    request_body = ChatMessageNotifyRequest,
    responses(
        (status = 200, description = "Whether a push was delivered", body = ChatNotifyResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Push delivery failed")
    ),
    tag = "Notifications"
)]
pub async fn notify_chat_message(
    State(state): State<AppState>,
    Path((chat_id, message_id)): Path<(String, String)>,
    payload: Result<Json<ChatMessageNotifyRequest>, JsonRejection>,
) -> ApiResult<Json<ChatNotifyResponse>> {
    let Json(payload) = payload?;
    let event = payload.into_event(chat_id, message_id);

    let delivered = state
        .notifications
        .chat_message_created(&event)
        .await
        .map_err(|e| ApiError::from_domain(e, "Failed to send chat notification"))?;

    Ok(Json(ChatNotifyResponse { delivered }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications/send", post(send_notification))
        .route(
            "/api/users/:user_id/fcm-token",
            put(register_token).delete(unregister_token),
        )
        .route(
            "/api/chats/:chat_id/messages/:message_id/notify",
            post(notify_chat_message),
        )
}
