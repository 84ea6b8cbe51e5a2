//! # AppError
//!
//! Centralized error handling for the marketplace crates.
//! Every variant is recoverable: callers surface it and carry on with the
//! state they had before the failing operation.

use thiserror::Error;

/// The primary error type for all cm-core and cm-services operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Listing, SavedSearch)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Field-level validation failure on user input
    #[error("invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Capability failure (listing not created in this session, wrong admin passphrase)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// State does not allow the requested transition
    #[error("conflict: {0}")]
    Conflict(String),

    /// Imported document is not a sequence of the expected records
    #[error("invalid import format: {0}")]
    ImportFormat(String),

    /// Image could not be decoded or encoded
    #[error("media error: {0}")]
    Media(String),

    /// Backend read/write failure
    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        AppError::NotFound(kind.into(), id.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Storage(format!("{err:#}"))
    }
}

/// A specialized Result type for marketplace logic.
pub type Result<T> = std::result::Result<T, AppError>;
