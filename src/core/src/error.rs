//! Error types shared by the registry, connectors and the dispatch engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while loading or validating shared configuration
#[derive(Debug, Error)]
pub enum CoreError {
    /// Connection registry could not be read
    #[error("Registry error: {0}")]
    Registry(String),

    /// Connection definitions are inconsistent
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/Deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a registry error
    pub fn registry<S: Into<String>>(msg: S) -> Self {
        CoreError::Registry(msg.into())
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        CoreError::Configuration(msg.into())
    }
}

/// Failure raised by a single connector invocation
///
/// `Domain` is the recognized, expected kind of failure (bad credentials,
/// malformed connection configuration, an upstream refusing the request).
/// Anything else a connector raises is `Unexpected`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    #[error("{0}")]
    Domain(String),

    #[error("{0}")]
    Unexpected(String),
}

impl ConnectorError {
    /// Create a recognized, domain-level failure
    pub fn domain<S: Into<String>>(msg: S) -> Self {
        ConnectorError::Domain(msg.into())
    }

    /// Create an unexpected failure
    pub fn unexpected<S: Into<String>>(msg: S) -> Self {
        ConnectorError::Unexpected(msg.into())
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, ConnectorError::Domain(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let err = CoreError::registry("missing file");
        assert!(matches!(err, CoreError::Registry(_)));

        let err = CoreError::configuration("duplicate name");
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::configuration("duplicate connection 'ad'");
        assert_eq!(err.to_string(), "Configuration error: duplicate connection 'ad'");

        let err = ConnectorError::domain("bad credentials");
        assert_eq!(err.to_string(), "bad credentials");
    }

    #[test]
    fn test_connector_error_kind() {
        assert!(ConnectorError::domain("x").is_domain());
        assert!(!ConnectorError::unexpected("x").is_domain());
    }
}
