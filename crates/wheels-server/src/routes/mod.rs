//! Wheels API Routes
//!
//! - /api/payments/alfalah - Bank Alfalah hosted checkout
//! - /api/payments/stripe - Stripe PaymentIntents and webhook
//! - /api/payments/plans - Featured listing plans
//! - /api/uploads - Signed upload credentials
//! - /api/notifications, /api/users/:id/fcm-token, /api/chats/... - Push and chat triggers
//! - /ws - Realtime event stream

pub mod alfalah;
pub mod notifications;
pub mod plans;
pub mod realtime;
pub mod stripe;
pub mod swagger;
pub mod uploads;
