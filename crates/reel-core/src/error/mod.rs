//! Error types and result aliases for ReelNet client operations.
//!
//! Two families live here. [`ReelError`] covers setup and programming
//! mistakes (bad configuration, duplicate endpoints, unserializable
//! arguments). [`NormalizedError`] is the serializable value every request
//! failure is turned into before it reaches a cache entry or a caller.

mod normalized;

pub use normalized::{ErrorKind, NormalizedError, FieldErrors};

use thiserror::Error;

/// Unified error type for client setup and registry misuse
#[derive(Error, Debug)]
pub enum ReelError {
    // Config errors
    #[error("Failed to parse {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Transport setup errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Registry errors
    #[error("Endpoint '{name}' is already registered")]
    DuplicateEndpoint { name: String },

    #[error("Endpoint '{name}' is not registered on this api")]
    UnknownEndpoint { name: String },

    #[error("Endpoint '{endpoint}' uses tag type '{tag}' which was not declared")]
    UndeclaredTag { endpoint: String, tag: String },

    #[error("Arguments for '{endpoint}' cannot be canonicalized: {message}")]
    Canonicalization { endpoint: String, message: String },

    // Auth errors
    #[error("Authentication error: {message}")]
    Auth { message: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for ReelNet client operations
pub type ReelResult<T> = Result<T, ReelError>;

impl ReelError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create a validation error for a configuration field
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReelError::Network { .. } | ReelError::Io { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ReelError::ConfigParse { .. } => Some("Check reel.toml for syntax errors"),
            ReelError::ConfigValidation { .. } => {
                Some("Fix the field in reel.toml or the matching REEL_* environment variable")
            },
            ReelError::Network { .. } => Some("Check your internet connection and try again"),
            ReelError::DuplicateEndpoint { .. } => {
                Some("Give every endpoint a unique name within one api")
            },
            ReelError::UnknownEndpoint { .. } => {
                Some("Use the endpoint handle returned by the builder that produced this api")
            },
            ReelError::UndeclaredTag { .. } => {
                Some("Add the tag type to ApiBuilder::tag_types before registering endpoints")
            },
            ReelError::Auth { .. } => Some("Check the auth domain, client id and callback url"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReelError::DuplicateEndpoint { name: "getPosts".to_string() };
        assert_eq!(err.to_string(), "Endpoint 'getPosts' is already registered");

        let err = ReelError::invalid_config("api.base_url", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Configuration field 'api.base_url' is invalid: must not be empty"
        );
    }

    #[test]
    fn test_recoverable() {
        let io = ReelError::io(
            "read failed".to_string(),
            std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        );
        assert!(io.is_recoverable());

        let dup = ReelError::DuplicateEndpoint { name: "x".to_string() };
        assert!(!dup.is_recoverable());
    }

    #[test]
    fn test_suggestion() {
        let err = ReelError::UndeclaredTag {
            endpoint: "getPosts".to_string(),
            tag: "Comments".to_string(),
        };
        assert!(err.suggestion().unwrap().contains("tag_types"));

        let err = ReelError::Canonicalization {
            endpoint: "getPosts".to_string(),
            message: "map key must be a string".to_string(),
        };
        assert!(err.suggestion().is_none());
    }
}
