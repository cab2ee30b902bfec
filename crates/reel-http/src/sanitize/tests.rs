//! Unit tests for diagnostic sanitization

use super::*;
use chrono::TimeZone;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
struct Outer(Inner);

#[derive(Debug)]
struct Inner;

impl fmt::Display for Outer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request failed")
    }
}

impl fmt::Display for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("connection reset")
    }
}

impl StdError for Outer {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.0)
    }
}

impl StdError for Inner {}

#[test]
fn test_function_becomes_marker() {
    let value = DynValue::Function("transformRequest".to_string());
    assert_eq!(make_serializable(&value), json!("[Function]"));
}

#[test]
fn test_date_becomes_iso_string() {
    let date = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
    assert_eq!(make_serializable(&date.into()), json!("2024-03-01T08:30:00.000Z"));
}

#[test]
fn test_error_becomes_name_message_stack() {
    let captured = ErrorValue::capture("TransportError", &Outer(Inner));
    let value = make_serializable(&captured.into());

    assert_eq!(value["name"], "TransportError");
    assert_eq!(value["message"], "request failed");
    assert_eq!(
        value["stack"],
        "TransportError: request failed\n    caused by: connection reset"
    );
}

#[test]
fn test_non_finite_floats_become_null() {
    assert_eq!(make_serializable(&DynValue::Float(f64::NAN)), Value::Null);
    assert_eq!(make_serializable(&DynValue::Float(f64::INFINITY)), Value::Null);
    assert_eq!(make_serializable(&DynValue::Float(1.5)), json!(1.5));
}

#[test]
fn test_bytes_become_base64() {
    assert_eq!(make_serializable(&DynValue::Bytes(b"reel".to_vec())), json!("cmVlbA=="));
}

#[test]
fn test_nested_structures_are_walked() {
    let date = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let value = DynValue::object([
        ("url", DynValue::from("posts")),
        (
            "hooks",
            DynValue::Array(vec![
                DynValue::Function("a".to_string()),
                DynValue::Function("b".to_string()),
            ]),
        ),
        (
            "meta",
            DynValue::object([
                ("sentAt", DynValue::from(date)),
                ("attempt", DynValue::from(2u64)),
                ("ratio", DynValue::Float(f64::NAN)),
            ]),
        ),
        ("raw", DynValue::from(json!({"already": ["plain"]}))),
    ]);

    assert_eq!(
        make_serializable(&value),
        json!({
            "url": "posts",
            "hooks": ["[Function]", "[Function]"],
            "meta": {
                "sentAt": "2024-01-02T03:04:05.000Z",
                "attempt": 2,
                "ratio": null
            },
            "raw": {"already": ["plain"]}
        })
    );
}

#[test]
fn test_optional_helper() {
    assert_eq!(make_serializable(&DynValue::optional(None::<String>)), Value::Null);
    assert_eq!(make_serializable(&DynValue::optional(Some("x"))), json!("x"));
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn leaf() -> impl Strategy<Value = DynValue> {
        prop_oneof![
            Just(DynValue::Null),
            any::<bool>().prop_map(DynValue::Bool),
            any::<i64>().prop_map(DynValue::Int),
            any::<f64>().prop_map(DynValue::Float),
            ".*".prop_map(DynValue::String),
            prop::collection::vec(any::<u8>(), 0..16).prop_map(DynValue::Bytes),
            "[a-zA-Z]{1,8}".prop_map(DynValue::Function),
            (0i64..4_000_000_000).prop_map(|secs| {
                DynValue::Date(Utc.timestamp_opt(secs, 0).unwrap())
            }),
            ("[A-Za-z]{1,10}", ".*").prop_map(|(name, message)| {
                DynValue::Error(ErrorValue { name, message, stack: Vec::new() })
            }),
        ]
    }

    fn tree() -> impl Strategy<Value = DynValue> {
        leaf().prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(DynValue::Array),
                prop::collection::vec(("[a-z]{1,6}", inner), 0..8).prop_map(DynValue::Object),
            ]
        })
    }

    proptest! {
        #[test]
        fn sanitized_values_always_round_trip(value in tree()) {
            let json = make_serializable(&value);
            let text = serde_json::to_string(&json).unwrap();
            let back: Value = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(back, json);
        }
    }
}
