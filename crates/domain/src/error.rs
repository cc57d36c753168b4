//! Domain error types.

use common::{OrderStatus, ParseStatusError};
use order_store::{StoreError, UNAVAILABLE_MESSAGE};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The order, or a product it references, does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// The request is missing or carries malformed fields.
    #[error("{0}")]
    Validation(String),

    /// The active transition policy refused the status change.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The database stayed unreachable after retries.
    #[error("{}", UNAVAILABLE_MESSAGE)]
    Unavailable(#[source] StoreError),

    /// Any other store failure.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn order_not_found() -> Self {
        DomainError::NotFound { entity: "Order" }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, .. } => DomainError::NotFound { entity },
            StoreError::InvalidTransition { from, to } => {
                DomainError::InvalidTransition { from, to }
            }
            e @ StoreError::Unavailable { .. } => DomainError::Unavailable(e),
            e => DomainError::Store(e),
        }
    }
}

impl From<ParseStatusError> for DomainError {
    fn from(e: ParseStatusError) -> Self {
        DomainError::Validation(e.to_string())
    }
}
