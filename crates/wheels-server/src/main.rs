use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod adapters;
mod application;
mod auth;
mod config;
mod error;
mod models;
mod routes;
#[cfg(test)]
mod test_support;

use adapters::{FcmNotifier, HttpAlfalahGateway, HttpStripeClient};
use application::{
    AlfalahCheckout, NotificationService, RealtimeHub, StripeCheckout, StripeWebhook,
    UploadSigner,
};
use config::ServerConfig;
use wheels::{BankGateway, PaymentIntentService, PushNotifier};

/// Checkout service over whichever bank gateway is wired in
pub type AppCheckout = AlfalahCheckout<dyn BankGateway>;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub api_key: Option<String>,
    pub checkout: Option<Arc<AppCheckout>>,
    pub stripe: Option<Arc<StripeCheckout>>,
    pub stripe_webhook: Option<Arc<StripeWebhook>>,
    pub uploads: UploadSigner,
    pub notifications: Arc<NotificationService>,
    pub hub: RealtimeHub,
}

impl AppState {
    /// Wire HTTP adapters for every configured gateway
    pub fn from_config(config: ServerConfig) -> Self {
        let hub = RealtimeHub::default();

        if config.api_key.is_some() {
            tracing::info!("🔐 API key authentication enabled");
        } else {
            tracing::warn!("⚠️  No WHEELS_API_KEY set - authentication disabled");
        }

        let checkout = match &config.alfalah {
            Some(alfalah) => {
                let gateway: Arc<dyn BankGateway> = Arc::new(HttpAlfalahGateway::new(alfalah));
                tracing::info!(base_url = %alfalah.base_url, "🏦 Bank Alfalah gateway initialized");
                Some(Arc::new(AlfalahCheckout::new(gateway, alfalah.merchant.clone())))
            }
            None => {
                tracing::warn!("⚠️  Alfalah merchant credentials missing - bank checkout disabled");
                None
            }
        };

        let stripe = match &config.stripe {
            Some(stripe) => {
                let client: Arc<dyn PaymentIntentService> = Arc::new(HttpStripeClient::new(stripe));
                tracing::info!(currency = %stripe.currency, "💳 Stripe initialized");
                Some(Arc::new(StripeCheckout::new(client, stripe.currency.clone())))
            }
            None => {
                tracing::warn!("⚠️  No STRIPE_SECRET_KEY set - Stripe disabled");
                None
            }
        };

        let stripe_webhook = config.stripe_webhook.clone().map(|webhook| {
            tracing::info!("🪝 Stripe webhook verification enabled");
            Arc::new(StripeWebhook::new(webhook))
        });
        if stripe_webhook.is_none() {
            tracing::warn!("⚠️  No STRIPE_WEBHOOK_SECRET set - Stripe webhook disabled");
        }

        if config.cloudinary.is_none() {
            tracing::warn!("⚠️  No CLOUDINARY_API_SECRET set - upload signatures disabled");
        }
        if config.storage.is_none() {
            tracing::warn!("⚠️  No GCS bucket credentials set - signed upload URLs disabled");
        }
        let uploads = UploadSigner::new(config.cloudinary.clone(), config.storage.clone());

        let notifier = config.fcm.as_ref().map(|fcm| {
            tracing::info!(project_id = %fcm.project_id, "🔔 FCM notifier initialized");
            Arc::new(FcmNotifier::new(fcm)) as Arc<dyn PushNotifier>
        });
        if notifier.is_none() {
            tracing::warn!("⚠️  FCM credentials missing - push notifications disabled");
        }
        let notifications = Arc::new(NotificationService::new(notifier, hub.clone()));

        Self {
            api_key: config.api_key,
            checkout,
            stripe,
            stripe_webhook,
            uploads,
            notifications,
            hub,
        }
    }
}

#[derive(Serialize)]
struct HealthCheck {
    status: String,
    message: String,
    version: String,
}

async fn health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "ok".to_string(),
        message: "Wheels API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Assemble every route with auth, CORS and tracing layers
pub fn build_router(state: AppState) -> Router {
    // Protected routes (require authentication)
    let protected_routes = Router::new()
        .merge(routes::plans::router())
        .merge(routes::alfalah::router())
        .merge(routes::stripe::router())
        .merge(routes::uploads::router())
        .merge(routes::notifications::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    // Authenticated by signature (webhook) or by the key on the upgrade (/ws)
    let public_routes = Router::new()
        .merge(routes::stripe::webhook_router())
        .merge(routes::realtime::router());

    // OpenAPI documentation
    let openapi = routes::swagger::ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .route("/health", get(health_check))
        .merge(protected_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[shuttle_runtime::main]
async fn main(
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> shuttle_axum::ShuttleAxum {
    tracing::info!("🚗 Wheels API initializing...");

    // Local runs may keep keys in .env instead of Secrets.toml
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_lookup(|key| {
        secrets.get(key).or_else(|| std::env::var(key).ok())
    })?;
    let state = AppState::from_config(config);

    let router = build_router(state);

    tracing::info!("📚 Swagger UI: /swagger-ui");
    tracing::info!("✅ Wheels API ready");

    Ok(router.into())
}
