//! Conversion of transport failures into [`NormalizedError`]

use chrono::Utc;
use reel_config::settings::DEFAULT_FALLBACK_MESSAGE;
use reel_config::ApiSettings;
use reel_core::error::{ErrorKind, FieldErrors, NormalizedError};
use serde_json::{Map, Value};

use crate::sanitize::{make_serializable, DynValue, ErrorValue};
use crate::transport::TransportError;

/// Transport classification codes used when the server sends none
pub mod codes {
    pub const NETWORK: &str = "ERR_NETWORK";
    pub const TIMEOUT: &str = "ETIMEDOUT";
    pub const BAD_REQUEST: &str = "ERR_BAD_REQUEST";
    pub const BAD_RESPONSE: &str = "ERR_BAD_RESPONSE";
    pub const BAD_PAYLOAD: &str = "ERR_BAD_PAYLOAD";
    pub const INVALID_URL: &str = "ERR_INVALID_URL";
}

/// What could be recovered from an error response body
#[derive(Debug, Default, PartialEq)]
struct ServerPayload {
    message: Option<String>,
    code: Option<String>,
    field_errors: Option<FieldErrors>,
}

impl ServerPayload {
    /// Understands `{message, errors}` as well as the backend envelope
    /// `{status: "ERROR", error: {message, code, field, details}}`
    fn parse(body: &Value) -> Self {
        let Some(object) = body.as_object() else {
            return Self::default();
        };

        let envelope = object.get("error").and_then(Value::as_object);

        let message = non_blank(object.get("message"))
            .or_else(|| envelope.and_then(|error| non_blank(error.get("message"))));

        let code = non_blank(object.get("code"))
            .or_else(|| envelope.and_then(|error| non_blank(error.get("code"))));

        let field_errors = object
            .get("errors")
            .and_then(Value::as_object)
            .map(field_map)
            .or_else(|| {
                let error = envelope?;
                match error.get("details").and_then(Value::as_object) {
                    Some(details) => Some(field_map(details)),
                    None => {
                        // Single-field validation failure
                        let field = non_blank(error.get("field"))?;
                        let message = non_blank(error.get("message"))?;
                        Some(FieldErrors::from([(field, vec![message])]))
                    }
                }
            })
            .filter(|fields| !fields.is_empty());

        Self {
            message,
            code,
            field_errors,
        }
    }
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Field values are kept verbatim; a lone string becomes a one-element list
fn field_map(object: &Map<String, Value>) -> FieldErrors {
    object
        .iter()
        .map(|(field, value)| {
            let messages = match value {
                Value::String(message) => vec![message.clone()],
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(message) => message.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
                other => vec![other.to_string()],
            };
            (field.clone(), messages)
        })
        .collect()
}

/// Turns every [`TransportError`] into the serializable [`NormalizedError`]
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNormalizer {
    fallback_message: String,
}

impl Default for ErrorNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_MESSAGE)
    }
}

impl ErrorNormalizer {
    pub fn new(fallback_message: impl Into<String>) -> Self {
        Self {
            fallback_message: fallback_message.into(),
        }
    }

    pub fn from_settings(settings: &ApiSettings) -> Self {
        Self::new(settings.fallback_message.clone())
    }

    pub fn fallback_message(&self) -> &str {
        &self.fallback_message
    }

    /// Never panics; unknown payload shapes fall back to the localized message
    pub fn normalize(&self, error: &TransportError) -> NormalizedError {
        let normalized = match error {
            TransportError::InvalidRequest { .. } => {
                NormalizedError::new(ErrorKind::Network, self.fallback_message.clone())
                    .with_code(codes::INVALID_URL)
            }
            TransportError::Network { .. } => {
                NormalizedError::new(ErrorKind::Network, self.fallback_message.clone())
                    .with_code(codes::NETWORK)
            }
            TransportError::Timeout { .. } => {
                NormalizedError::new(ErrorKind::Timeout, self.fallback_message.clone())
                    .with_code(codes::TIMEOUT)
            }
            TransportError::Decode { status, .. } => {
                NormalizedError::new(ErrorKind::Serialization, self.fallback_message.clone())
                    .with_status(*status)
                    .with_code(codes::BAD_PAYLOAD)
            }
            TransportError::Status { status, body, .. } => {
                let payload = body.as_ref().map(ServerPayload::parse).unwrap_or_default();
                let code = payload.code.unwrap_or_else(|| {
                    if (400..500).contains(status) {
                        codes::BAD_REQUEST.to_string()
                    } else {
                        codes::BAD_RESPONSE.to_string()
                    }
                });
                let mut normalized = NormalizedError::new(
                    ErrorKind::Http,
                    payload
                        .message
                        .unwrap_or_else(|| self.fallback_message.clone()),
                )
                .with_status(*status)
                .with_code(code);
                if let Some(fields) = payload.field_errors {
                    normalized = normalized.with_field_errors(fields);
                }
                normalized
            }
        };

        normalized.with_details(self.details(error))
    }

    /// Sanitized request and response diagnostics
    fn details(&self, error: &TransportError) -> Value {
        let config = serde_json::to_value(error.request()).unwrap_or(Value::Null);

        let response = match error {
            TransportError::Status {
                status,
                status_text,
                headers,
                body,
                ..
            } => DynValue::object([
                ("status", DynValue::from(*status)),
                ("statusText", DynValue::from(status_text.as_str())),
                (
                    "headers",
                    DynValue::object(
                        headers
                            .iter()
                            .map(|(name, value)| (name.clone(), DynValue::from(value.as_str()))),
                    ),
                ),
                ("data", DynValue::optional(body.clone())),
            ]),
            TransportError::Decode { status, .. } => {
                DynValue::object([("status", DynValue::from(*status))])
            }
            _ => DynValue::Null,
        };

        make_serializable(&DynValue::object([
            ("config", DynValue::from(config)),
            ("response", response),
            ("error", DynValue::from(ErrorValue::capture(error.name(), error))),
            ("occurredAt", DynValue::from(Utc::now())),
        ]))
    }
}
