/// Error taxonomy for store and trigger operations
///
/// Every failing operation surfaces one of these synchronously to the caller.
/// The API layer maps them onto HTTP statuses; the messages are meant to be
/// shown to users verbatim.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced id did not resolve to a document.
    #[error("{0}")]
    NotFound(String),

    /// Malformed input rejected at the operation boundary.
    #[error("{0}")]
    InvalidArgument(String),

    /// A uniqueness constraint was violated (duplicate slug, duplicate edge).
    #[error("{0}")]
    Conflict(String),

    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// True when the wrapped sqlx error is a unique-index violation.
    /// Used to translate constraint hits into `Conflict` with a proper message.
    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .is_some_and(|db| db.is_unique_violation())
    }

    /// True when the wrapped sqlx error is a foreign-key violation.
    /// Surfaces as `NotFound`: a referenced row vanished between the
    /// boundary check and the write.
    pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .is_some_and(|db| db.is_foreign_key_violation())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
