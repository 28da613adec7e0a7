/*!
 * Error types for the nextstep application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with the student store
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A lookup by id found no record
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier that missed
        id: String,
    },

    /// A unique constraint rejected the write
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// The underlying store failed
    #[error("Store error: {0}")]
    Store(String),
}

impl RepositoryError {
    /// Shorthand for a missing record keyed by an integer id
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether this error reports a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Self::Duplicate(error.to_string())
            }
            _ => Self::Store(error.to_string()),
        }
    }
}

impl From<anyhow::Error> for RepositoryError {
    fn from(error: anyhow::Error) -> Self {
        // Typed errors raised inside a database closure travel through anyhow
        match error.downcast::<RepositoryError>() {
            Ok(inner) => inner,
            Err(error) => match error.downcast::<rusqlite::Error>() {
                Ok(sqlite) => sqlite.into(),
                Err(other) => Self::Store(format!("{:#}", other)),
            },
        }
    }
}

/// A single rejected form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as shown to the user
    pub field: &'static str,
    /// Why the value was rejected
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors raised before a request reaches the repository
#[derive(Error, Debug)]
pub enum ValidationError {
    /// One or more fields failed validation
    #[error("Invalid input: {}", join_fields(.0))]
    Invalid(Vec<FieldError>),
}

impl ValidationError {
    /// The rejected fields
    pub fn fields(&self) -> &[FieldError] {
        match self {
            Self::Invalid(fields) => fields,
        }
    }
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration loading or validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the student store
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Error from input validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Error while reading the seed dataset
    #[error("Seed error: {0}")]
    Seed(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Whether this error means the requested record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repository(e) if e.is_not_found())
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(error: csv::Error) -> Self {
        Self::Seed(error.to_string())
    }
}
