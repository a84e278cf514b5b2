//! Domain Errors
//!
//! Error types for domain operations.

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("Service not configured: {0}")]
    NotConfigured(String),

    /// The gateway answered, but refused the request
    #[error("{message}")]
    Gateway { gateway: String, message: String },

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl DomainError {
    pub fn not_found<T: AsRef<str>>(entity_type: T, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_ref().to_string(),
            id: id.to_string(),
        }
    }

    pub fn gateway<G: AsRef<str>, M: Into<String>>(gateway: G, message: M) -> Self {
        Self::Gateway {
            gateway: gateway.as_ref().to_string(),
            message: message.into(),
        }
    }
}
