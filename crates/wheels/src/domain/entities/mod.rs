//! Domain Entities
//!
//! DTOs mirrored from the external platforms this backend talks to.
//! - Bank: Bank Alfalah handshake, initialization and order status
//! - Stripe: PaymentIntent and webhook events
//! - Plan: Featured listing plans
//! - Upload: Cloudinary signatures and Cloud Storage signed URLs
//! - Notification: push messages and realtime envelopes

mod bank;
mod notification;
mod plan;
mod stripe;
mod upload;

pub use bank::*;
pub use notification::*;
pub use plan::*;
pub use stripe::*;
pub use upload::*;
