//! Infrastructure Adapters
//!
//! Implementations of domain ports over HTTP.

pub mod alfalah;
pub mod fcm;
pub mod stripe;

// Re-exports
pub use alfalah::HttpAlfalahGateway;
pub use fcm::FcmNotifier;
pub use stripe::HttpStripeClient;
