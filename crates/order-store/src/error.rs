use common::OrderStatus;
use thiserror::Error;

/// Message surfaced once connection retries are exhausted.
pub const UNAVAILABLE_MESSAGE: &str =
    "Database unavailable. Please check your connection and try again later.";

/// Lower-cased fragments that mark an error message as a transient
/// connectivity failure.
const CONNECTION_MARKERS: [&str; 8] = [
    "can't reach database server",
    "could not connect",
    "connection refused",
    "address not found",
    "pool",
    "timed out",
    "connection",
    "network",
];

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// The transition planner refused the requested status change.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A backend failure reported only as text.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A stored value could not be decoded into the model.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Connection retries were exhausted.
    #[error("{}", UNAVAILABLE_MESSAGE)]
    Unavailable {
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub fn order_not_found(id: impl Into<i64>) -> Self {
        StoreError::NotFound {
            entity: "Order",
            id: id.into(),
        }
    }

    pub fn product_not_found(id: impl Into<i64>) -> Self {
        StoreError::NotFound {
            entity: "Product",
            id: id.into(),
        }
    }

    /// Wraps the last transient failure after the retry budget is spent.
    pub fn unavailable(cause: StoreError) -> Self {
        StoreError::Unavailable {
            source: Box::new(cause),
        }
    }

    /// Classifies a failed commit.
    ///
    /// The server may have applied the transaction before the connection
    /// dropped, so a connection failure at this point is reported as
    /// unavailable straight away and never retried.
    pub fn commit_failed(cause: StoreError) -> Self {
        if cause.is_connection_error() {
            StoreError::unavailable(cause)
        } else {
            cause
        }
    }

    /// Returns true if this is a transient infrastructure failure worth
    /// retrying.
    ///
    /// Only infrastructure variants are inspected. Business outcomes such as
    /// `NotFound` are never classified, whatever their message says.
    pub fn is_connection_error(&self) -> bool {
        match self {
            StoreError::Database(
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed,
            ) => true,
            StoreError::Database(_) | StoreError::Backend(_) => {
                is_connection_message(&self.to_string())
            }
            _ => false,
        }
    }
}

/// Case-insensitive substring check against the connection markers.
pub fn is_connection_message(message: &str) -> bool {
    let message = message.to_lowercase();
    CONNECTION_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
