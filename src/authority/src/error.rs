//! Error types for the ACL resolution engine

use aclgate_core::{ConnectorError, CoreError};
use std::time::Duration;
use thiserror::Error;

/// ACL resolution errors
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// Dispatch infrastructure is not running, or a mapping connection
    /// names a prerequisite that does not exist
    #[error("System improperly initialized: {0}")]
    MisconfiguredSystem(String),

    /// A connector reported a recognized failure
    #[error("From {backend}: {message}")]
    DomainFailure { backend: String, message: String },

    /// A connector failed in an unrecognized way
    #[error("From {backend}: {message}")]
    UnexpectedFailure { backend: String, message: String },

    /// The request was abandoned while waiting
    #[error("Request cancelled")]
    Cancelled,

    /// The bounded wait at the orchestration boundary elapsed
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection definitions are unusable (cyclic mappings, bad registry)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A completion cell was completed twice
    #[error("Completion cell for '{0}' was already completed")]
    DoubleCompletion(String),

    /// A mapping cell was bound to an identity twice
    #[error("Completion cell for '{0}' already has an identity bound")]
    AlreadyBound(String),

    /// Registry or other shared-layer error
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// How an error surfaces at the response boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Recognized backend failure; access must be refused
    Forbidden,
    /// Anything the system did not expect
    InternalError,
    /// No response is produced at all
    NoResponse,
}

impl AuthorityError {
    /// Build the request-aborting error for a failure captured on a cell
    pub fn from_connector(backend: impl Into<String>, err: &ConnectorError) -> Self {
        match err {
            ConnectorError::Domain(message) => AuthorityError::DomainFailure {
                backend: backend.into(),
                message: message.clone(),
            },
            ConnectorError::Unexpected(message) => AuthorityError::UnexpectedFailure {
                backend: backend.into(),
                message: message.clone(),
            },
        }
    }

    pub fn classify(&self) -> ErrorClass {
        match self {
            AuthorityError::DomainFailure { .. } => ErrorClass::Forbidden,
            AuthorityError::Cancelled => ErrorClass::NoResponse,
            _ => ErrorClass::InternalError,
        }
    }
}

/// Result type for ACL resolution
pub type Result<T> = std::result::Result<T, AuthorityError>;
