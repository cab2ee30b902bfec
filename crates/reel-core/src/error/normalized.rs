//! The serializable error shape stored in cache entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Field-level validation messages keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Failure classification of a [`NormalizedError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No response was received (DNS, connection refused, offline)
    Network,
    /// The request exceeded its time budget
    Timeout,
    /// A response arrived with a non-2xx status
    Http,
    /// The response body could not be parsed or decoded
    Serialization,
    /// Interest in the result was withdrawn before completion
    Cancelled,
}

/// Structured, serializable error surfaced to every caller of the registry.
///
/// Raw transport errors never leave the HTTP layer; they are converted into
/// this shape first. `details` holds sanitized request/response diagnostics
/// and is always plain JSON.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct NormalizedError {
    /// Human-readable message, either from the server or the fallback
    pub message: String,
    /// HTTP status when a response was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Server or transport error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Validation errors reported by the server, preserved verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
    /// Failure classification
    pub kind: ErrorKind,
    /// Sanitized diagnostics (request config, response metadata)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl NormalizedError {
    /// Create an error of the given kind with no status or code
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: None,
            field_errors: None,
            kind,
            details: None,
        }
    }

    /// Error for a request that exceeded its time budget
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message).with_code("ETIMEDOUT")
    }

    /// Error for a response body that could not be decoded into the expected type
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message).with_code("ERR_BAD_PAYLOAD")
    }

    /// Error for a request whose subscribers went away before it completed
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message).with_code("ERR_CANCELED")
    }

    /// Set the HTTP status
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach field-level validation errors
    pub fn with_field_errors(mut self, field_errors: FieldErrors) -> Self {
        self.field_errors = Some(field_errors);
        self
    }

    /// Attach sanitized diagnostics
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Messages reported for one field, if any
    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.field_errors
            .as_ref()
            .and_then(|errors| errors.get(name))
            .map(Vec::as_slice)
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self.kind {
            ErrorKind::Network | ErrorKind::Timeout => true,
            ErrorKind::Http => self.status.map_or(false, |status| status >= 500),
            ErrorKind::Serialization | ErrorKind::Cancelled => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_methods() {
        let mut fields = FieldErrors::new();
        fields.insert("title".to_string(), vec!["must not be blank".to_string()]);

        let err = NormalizedError::new(ErrorKind::Http, "Validation failed")
            .with_status(400)
            .with_code("VALIDATION_ERROR")
            .with_field_errors(fields);

        assert_eq!(err.status, Some(400));
        assert_eq!(err.code.as_deref(), Some("VALIDATION_ERROR"));
        assert_eq!(err.field("title").unwrap(), ["must not be blank".to_string()]);
        assert!(err.field("content").is_none());
        assert_eq!(err.to_string(), "Validation failed");
    }

    #[test]
    fn test_serialized_shape() {
        let err = NormalizedError::timeout("took too long").with_status(504);
        let value = serde_json::to_value(&err).unwrap();

        assert_eq!(
            value,
            json!({
                "message": "took too long",
                "status": 504,
                "code": "ETIMEDOUT",
                "kind": "timeout"
            })
        );
    }

    #[test]
    fn test_round_trip_with_field_errors() {
        let mut fields = FieldErrors::new();
        fields.insert(
            "email".to_string(),
            vec!["invalid".to_string(), "taken".to_string()],
        );
        let err = NormalizedError::new(ErrorKind::Http, "bad")
            .with_status(422)
            .with_field_errors(fields)
            .with_details(json!({"config": {"url": "posts"}}));

        let text = serde_json::to_string(&err).unwrap();
        assert!(text.contains("fieldErrors"));
        let back: NormalizedError = serde_json::from_str(&text).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_is_transient() {
        assert!(NormalizedError::timeout("t").is_transient());
        assert!(NormalizedError::new(ErrorKind::Network, "n").is_transient());
        assert!(NormalizedError::new(ErrorKind::Http, "h").with_status(503).is_transient());
        assert!(!NormalizedError::new(ErrorKind::Http, "h").with_status(404).is_transient());
        assert!(!NormalizedError::serialization("s").is_transient());
        assert!(!NormalizedError::cancelled("c").is_transient());
    }
}
