//! Engine error types

use thiserror::Error;

/// Errors that can occur in the policy engine
#[derive(Error, Debug)]
pub enum PolicyError {
    /// Malformed node string passed to a write or to table construction
    #[error("Invalid node '{node}': {reason}")]
    Validation { node: String, reason: String },

    /// The policy store could not complete a read or write
    #[error("Policy store unavailable: {0}")]
    StoreUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PolicyError {
    /// Create a validation error for a node
    pub fn validation(node: impl Into<String>, reason: impl Into<String>) -> Self {
        PolicyError::Validation {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Create a store error
    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        PolicyError::StoreUnavailable(msg.into())
    }

    /// Whether this error came from the storage layer
    ///
    /// Storage failures are degraded to "no opinion" during evaluation,
    /// everything else is a caller bug.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            PolicyError::StoreUnavailable(_) | PolicyError::Io(_) | PolicyError::Serialization(_)
        )
    }
}

/// Result type alias for engine operations
pub type PolicyResult<T> = Result<T, PolicyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PolicyError::validation("Mod..ban", "empty segment");
        assert_eq!(err.to_string(), "Invalid node 'Mod..ban': empty segment");

        let err = PolicyError::store_unavailable("connection reset");
        assert_eq!(err.to_string(), "Policy store unavailable: connection reset");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PolicyError = io_err.into();
        assert!(matches!(err, PolicyError::Io(_)));
        assert!(err.is_store_failure());
    }

    #[test]
    fn test_validation_is_not_store_failure() {
        assert!(!PolicyError::validation("*.x", "bad").is_store_failure());
        assert!(!PolicyError::InvalidConfig("x".into()).is_store_failure());
    }
}
