//! Unified error type for the mass tracker.
//!
//! Core operations either succeed or fail with one of these variants. Callers decide
//! how to present them; the core never renders user-facing messages itself.

use thiserror::Error;

/// All failures surfaced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input. Always recoverable by correcting the input.
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// A referenced priest, series or mass does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier that failed to resolve
        id: String,
    },

    /// Attempt to consume a completed or deactivated bulk series.
    #[error("Bulk series {series_id} is not active")]
    InactiveSeries {
        /// The exhausted series
        series_id: i64,
    },

    /// Surfaced by the identity collaborator when credentials do not resolve.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Reason reported by the identity provider
        message: String,
    },

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Store failure, including injected faults. Always aborts the enclosing transaction.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
