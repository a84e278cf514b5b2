//! Server configuration
//!
//! Built from a key lookup so the same code reads Shuttle secrets in
//! production and plain maps in tests. A gateway whose required keys are
//! missing is left as `None` and its routes answer 503.

use anyhow::{Context, Result};
use wheels::domain::services::gcs_signer::HmacKey;
use wheels::domain::services::stripe_signature::DEFAULT_TOLERANCE_SECS;
use wheels::AlfalahMerchant;

pub const ALFALAH_SANDBOX_URL: &str = "https://sandbox.bankalfalah.com";
pub const ALFALAH_PRODUCTION_URL: &str = "https://payments.bankalfalah.com";
pub const STRIPE_API_BASE: &str = "https://api.stripe.com";
pub const FCM_API_BASE: &str = "https://fcm.googleapis.com";

#[derive(Debug, Clone)]
pub struct AlfalahConfig {
    pub base_url: String,
    pub merchant: AlfalahMerchant,
}

#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
    pub currency: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("currency", &self.currency)
            .finish()
    }
}

#[derive(Clone)]
pub struct StripeWebhookConfig {
    pub secret: String,
    pub tolerance_secs: i64,
}

impl std::fmt::Debug for StripeWebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeWebhookConfig")
            .field("secret", &"<redacted>")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub api_secret: String,
    pub folder: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("api_secret", &"<redacted>")
            .field("folder", &self.folder)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub key: HmacKey,
}

#[derive(Clone)]
pub struct FcmConfig {
    pub project_id: String,
    pub access_token: String,
    pub api_base: String,
}

impl std::fmt::Debug for FcmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FcmConfig")
            .field("project_id", &self.project_id)
            .field("access_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Everything the server reads at start-up
#[derive(Clone, Default)]
pub struct ServerConfig {
    pub api_key: Option<String>,
    pub alfalah: Option<AlfalahConfig>,
    pub stripe: Option<StripeConfig>,
    pub stripe_webhook: Option<StripeWebhookConfig>,
    pub cloudinary: Option<CloudinaryConfig>,
    pub storage: Option<StorageConfig>,
    pub fcm: Option<FcmConfig>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("alfalah", &self.alfalah)
            .field("stripe", &self.stripe)
            .field("stripe_webhook", &self.stripe_webhook)
            .field("cloudinary", &self.cloudinary)
            .field("storage", &self.storage)
            .field("fcm", &self.fcm)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let alfalah = match (
            get("ALFALAH_MERCHANT_ID"),
            get("ALFALAH_STORE_ID"),
            get("ALFALAH_MERCHANT_USERNAME"),
            get("ALFALAH_MERCHANT_PASSWORD"),
            get("ALFALAH_MERCHANT_HASH"),
        ) {
            (Some(merchant_id), Some(store_id), Some(username), Some(password), Some(hash)) => {
                let base_url = match get("ALFALAH_BASE_URL") {
                    Some(url) => url,
                    None => alfalah_base_url(get("ALFALAH_ENVIRONMENT").as_deref())?.to_string(),
                };
                Some(AlfalahConfig {
                    base_url: base_url.trim_end_matches('/').to_string(),
                    merchant: AlfalahMerchant {
                        merchant_id,
                        store_id,
                        username,
                        password,
                        merchant_hash: hash,
                        channel_id: get("ALFALAH_CHANNEL_ID").unwrap_or_else(|| "1001".into()),
                        currency: get("ALFALAH_CURRENCY").unwrap_or_else(|| "PKR".into()),
                    },
                })
            }
            _ => None,
        };

        let stripe = get("STRIPE_SECRET_KEY").map(|secret_key| StripeConfig {
            secret_key,
            api_base: get("STRIPE_API_BASE")
                .unwrap_or_else(|| STRIPE_API_BASE.into())
                .trim_end_matches('/')
                .to_string(),
            currency: get("STRIPE_CURRENCY")
                .unwrap_or_else(|| "pkr".into())
                .to_lowercase(),
        });

        let tolerance_secs = match get("STRIPE_WEBHOOK_TOLERANCE_SECS") {
            Some(raw) => raw
                .parse::<i64>()
                .with_context(|| format!("STRIPE_WEBHOOK_TOLERANCE_SECS is not a number: {raw}"))?,
            None => DEFAULT_TOLERANCE_SECS,
        };
        let stripe_webhook = get("STRIPE_WEBHOOK_SECRET").map(|secret| StripeWebhookConfig {
            secret,
            tolerance_secs,
        });

        let cloudinary = get("CLOUDINARY_API_SECRET").map(|api_secret| CloudinaryConfig {
            api_secret,
            folder: get("CLOUDINARY_FOLDER").unwrap_or_else(|| "listings".into()),
        });

        let storage = match (
            get("GCS_BUCKET"),
            get("GCS_HMAC_ACCESS_ID"),
            get("GCS_HMAC_SECRET"),
        ) {
            (Some(bucket), Some(access_id), Some(secret)) => Some(StorageConfig {
                bucket,
                key: HmacKey { access_id, secret },
            }),
            _ => None,
        };

        let fcm = match (get("FCM_PROJECT_ID"), get("FCM_ACCESS_TOKEN")) {
            (Some(project_id), Some(access_token)) => Some(FcmConfig {
                project_id,
                access_token,
                api_base: get("FCM_API_BASE")
                    .unwrap_or_else(|| FCM_API_BASE.into())
                    .trim_end_matches('/')
                    .to_string(),
            }),
            _ => None,
        };

        Ok(Self {
            api_key: get("WHEELS_API_KEY"),
            alfalah,
            stripe,
            stripe_webhook,
            cloudinary,
            storage,
            fcm,
        })
    }
}

fn alfalah_base_url(environment: Option<&str>) -> Result<&'static str> {
    match environment.map(|e| e.to_ascii_lowercase()).as_deref() {
        None | Some("sandbox") => Ok(ALFALAH_SANDBOX_URL),
        Some("production") | Some("live") => Ok(ALFALAH_PRODUCTION_URL),
        Some(other) => anyhow::bail!("Unknown ALFALAH_ENVIRONMENT: {other}"),
    }
}
