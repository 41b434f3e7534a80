//! Ticket store error types.

use thiserror::Error;

/// Errors that can occur during ticket store operations.
#[derive(Debug, Error)]
pub enum TicketStoreError {
    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Duplicate entity.
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },

    /// The backing store could not be reached in time.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// A persisted row could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl TicketStoreError {
    /// Creates a not found error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity_type,
            id: id.into(),
        }
    }
}

impl From<sqlx::Error> for TicketStoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                TicketStoreError::Unavailable(e.to_string())
            }
            other => TicketStoreError::Database(other.to_string()),
        }
    }
}

/// Result type for ticket store operations.
pub type TicketStoreResult<T> = Result<T, TicketStoreError>;
