//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::OpenApi;

use wheels::{
    FeaturedPlan, PaymentStatus, PaymentVerification, SignedUploadUrl, TransactionDetails,
    UploadSignature,
};

use crate::models::{
    ChatMessageNotifyRequest, ChatNotifyResponse, CreatePaymentIntentRequest,
    CreatePaymentIntentResponse, InitializePaymentRequest, DeviceTokenRequest,
    SendNotificationRequest, SendNotificationResponse, SuccessResponse, UploadUrlRequest,
    WebhookAck,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Payment endpoints
        super::alfalah::initialize_payment,
        super::alfalah::verify_payment,
        super::stripe::create_payment_intent,
        super::stripe::stripe_webhook,
        super::plans::list_plans,
        // Upload endpoints
        super::uploads::upload_signature,
        super::uploads::upload_url,
        // Notification endpoints
        super::notifications::send_notification,
        super::notifications::register_token,
        super::notifications::unregister_token,
        super::notifications::notify_chat_message,
    ),
    info(
        title = "Wheels API",
        version = "0.1.0",
        description = "Car marketplace backend: payments, upload signing, push notifications and realtime events.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Payments", description = "Bank Alfalah checkout, Stripe PaymentIntents and featured plans"),
        (name = "Uploads", description = "Signed Cloudinary and Cloud Storage uploads"),
        (name = "Notifications", description = "Push notifications and chat triggers"),
    ),
    components(
        schemas(
            // Payments
            InitializePaymentRequest,
            PaymentVerification,
            TransactionDetails,
            PaymentStatus,
            CreatePaymentIntentRequest,
            CreatePaymentIntentResponse,
            WebhookAck,
            FeaturedPlan,
            // Uploads
            UploadUrlRequest,
            UploadSignature,
            SignedUploadUrl,
            // Notifications
            SendNotificationRequest,
            SendNotificationResponse,
            DeviceTokenRequest,
            SuccessResponse,
            ChatMessageNotifyRequest,
            ChatNotifyResponse,
        )
    ),
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for path in [
            "/api/payments/alfalah/initialize",
            "/api/payments/alfalah/verify/{order_id}",
            "/api/payments/stripe/create-payment-intent",
            "/api/payments/stripe/webhook",
            "/api/payments/plans",
            "/api/uploads/signature",
            "/api/uploads/url",
            "/api/notifications/send",
            "/api/users/{user_id}/fcm-token",
            "/api/chats/{chat_id}/messages/{message_id}/notify",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
