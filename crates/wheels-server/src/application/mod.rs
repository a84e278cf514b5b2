//! Application Layer (Use Cases)
//!
//! Orchestrates domain operations and coordinates between
//! gateway ports and the realtime hub.

mod checkout_service;
mod notification_service;
mod realtime_hub;
mod stripe_service;
mod upload_service;

pub use checkout_service::AlfalahCheckout;
pub use notification_service::{NotificationService, PushReport, PushTarget};
pub use realtime_hub::RealtimeHub;
pub use stripe_service::{AmountSource, StripeCheckout, StripeWebhook};
pub use upload_service::UploadSigner;

#[cfg(test)]
pub(crate) mod testing;
