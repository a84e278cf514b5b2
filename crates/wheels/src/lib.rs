//! Wheels Domain Library
//!
//! Core domain types and interfaces for the Wheels car marketplace backend.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain/`): Pure business types and logic
//!   - `entities/`: Payment, plan, upload and notification models
//!   - `value_objects/`: Immutable value types (Money, PaymentStatus)
//!   - `services/`: Stateless signing (bank request hash, Cloudinary,
//!     Stripe webhook signatures, Cloud Storage V4 URLs)
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits) for the
//!   payment gateways and push delivery
//!
//! # Usage
//!
//! ```rust,ignore
//! use wheels::domain::services::signing::request_hash;
//! use wheels::ports::BankGateway;
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    AlfalahMerchant, ChatMessageEvent, CreatePaymentIntent, DomainError, FeaturedPlan,
    GatewayParams, HandshakeResponse, Money, OrderStatus, PaymentInitRequest, PaymentIntent,
    PaymentStatus, PaymentVerification, PushMessage, RealtimeEnvelope, SignedUploadUrl,
    StripeEvent, StripeEventKind, TransactionDetails, UploadSignature,
};
pub use ports::{BankGateway, PaymentIntentService, PushNotifier};
