//! Recursive conversion of diagnostic values into plain JSON.
//!
//! Error diagnostics are assembled from loosely typed pieces: request
//! configuration, response metadata, captured error chains, timestamps,
//! callbacks. [`DynValue`] models those pieces and [`make_serializable`]
//! walks the tree so the result can always cross a serialization boundary:
//!
//! - functions become the marker `"[Function]"`
//! - dates become ISO-8601 strings
//! - errors become `{name, message, stack}`
//! - non-finite floats become `null`
//! - raw bytes become standard base64
//! - sequences are mapped element-wise, objects key-by-key

use std::error::Error as StdError;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

/// Placeholder emitted for callables
pub const FUNCTION_MARKER: &str = "[Function]";

/// A loosely typed value that may not be directly serializable
#[derive(Debug, Clone)]
pub enum DynValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Date(DateTime<Utc>),
    /// A callable, identified by name for debugging only
    Function(String),
    Error(ErrorValue),
    Array(Vec<DynValue>),
    Object(Vec<(String, DynValue)>),
    /// Already-plain JSON
    Json(Value),
}

/// A captured error: type name, message and source chain
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub stack: Vec<String>,
}

impl ErrorValue {
    /// Capture an error and its `source()` chain
    pub fn capture<E: StdError + ?Sized>(name: impl Into<String>, error: &E) -> Self {
        let mut stack = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            stack.push(cause.to_string());
            source = cause.source();
        }
        Self {
            name: name.into(),
            message: error.to_string(),
            stack,
        }
    }

    /// Stack rendered the way error chains are printed elsewhere in the client
    fn render_stack(&self) -> String {
        let mut out = format!("{}: {}", self.name, self.message);
        for cause in &self.stack {
            out.push_str("\n    caused by: ");
            out.push_str(cause);
        }
        out
    }
}

impl DynValue {
    /// Build an object from key/value pairs
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, DynValue)>,
    {
        DynValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Wrap an optional value, mapping `None` to `Null`
    pub fn optional<T: Into<DynValue>>(value: Option<T>) -> Self {
        value.map_or(DynValue::Null, Into::into)
    }
}

impl From<bool> for DynValue {
    fn from(value: bool) -> Self {
        DynValue::Bool(value)
    }
}

impl From<i64> for DynValue {
    fn from(value: i64) -> Self {
        DynValue::Int(value)
    }
}

impl From<u64> for DynValue {
    fn from(value: u64) -> Self {
        DynValue::UInt(value)
    }
}

impl From<u16> for DynValue {
    fn from(value: u16) -> Self {
        DynValue::UInt(u64::from(value))
    }
}

impl From<f64> for DynValue {
    fn from(value: f64) -> Self {
        DynValue::Float(value)
    }
}

impl From<&str> for DynValue {
    fn from(value: &str) -> Self {
        DynValue::String(value.to_string())
    }
}

impl From<String> for DynValue {
    fn from(value: String) -> Self {
        DynValue::String(value)
    }
}

impl From<DateTime<Utc>> for DynValue {
    fn from(value: DateTime<Utc>) -> Self {
        DynValue::Date(value)
    }
}

impl From<ErrorValue> for DynValue {
    fn from(value: ErrorValue) -> Self {
        DynValue::Error(value)
    }
}

impl From<Value> for DynValue {
    fn from(value: Value) -> Self {
        DynValue::Json(value)
    }
}

impl<T: Into<DynValue>> From<Vec<T>> for DynValue {
    fn from(values: Vec<T>) -> Self {
        DynValue::Array(values.into_iter().map(Into::into).collect())
    }
}

/// Convert a [`DynValue`] tree into JSON that always serializes
pub fn make_serializable(value: &DynValue) -> Value {
    match value {
        DynValue::Null => Value::Null,
        DynValue::Bool(b) => Value::Bool(*b),
        DynValue::Int(n) => Value::Number(Number::from(*n)),
        DynValue::UInt(n) => Value::Number(Number::from(*n)),
        DynValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        DynValue::String(s) => Value::String(s.clone()),
        DynValue::Bytes(bytes) => Value::String(STANDARD.encode(bytes)),
        DynValue::Date(date) => {
            Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        DynValue::Function(_) => Value::String(FUNCTION_MARKER.to_string()),
        DynValue::Error(error) => {
            let mut map = Map::new();
            map.insert("name".to_string(), Value::String(error.name.clone()));
            map.insert("message".to_string(), Value::String(error.message.clone()));
            map.insert("stack".to_string(), Value::String(error.render_stack()));
            Value::Object(map)
        }
        DynValue::Array(items) => Value::Array(items.iter().map(make_serializable).collect()),
        DynValue::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), make_serializable(value)))
                .collect(),
        ),
        DynValue::Json(json) => json.clone(),
    }
}

#[cfg(test)]
mod tests;
