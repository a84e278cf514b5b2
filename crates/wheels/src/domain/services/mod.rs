//! Domain Services
//!
//! Stateless signing and verification used by the gateways.

pub mod gcs_signer;
pub mod signing;
pub mod stripe_signature;
