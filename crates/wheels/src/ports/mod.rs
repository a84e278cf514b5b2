//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the domain layer
//! interacts with external systems (payment gateways, push delivery).
//!
//! Implementations of these traits live in the server's adapters.

pub mod notifier;
pub mod payments;

// Re-exports
pub use notifier::*;
pub use payments::*;
