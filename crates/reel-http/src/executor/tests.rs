//! Unit tests for the HTTP query executor

use super::*;

use reel_auth::StaticSession;
use reel_core::error::ErrorKind;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(server: &MockServer) -> ApiSettings {
    ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    }
}

#[tokio::test]
async fn test_success_passes_response_through() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/posts/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5})))
        .mount(&server)
        .await;

    let base_query = HttpBaseQuery::from_settings(&settings_for(&server)).unwrap();
    let response = base_query.execute(RequestDescriptor::get("posts/5")).await.unwrap();

    assert_eq!(response.body, json!({"id": 5}));
}

#[tokio::test]
async fn test_session_token_is_attached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/me"))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sub": "u1"})))
        .expect(1)
        .mount(&server)
        .await;

    let base_query = HttpBaseQuery::from_settings(&settings_for(&server))
        .unwrap()
        .with_session(Arc::new(StaticSession::new("session-token")));

    base_query.execute(RequestDescriptor::get("me")).await.unwrap();
}

#[tokio::test]
async fn test_failure_is_normalized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/posts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let base_query = HttpBaseQuery::from_settings(&settings_for(&server))
        .unwrap()
        .with_session(Arc::new(StaticSession::anonymous()));
    let err = base_query.execute(RequestDescriptor::get("posts")).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Http);
    assert_eq!(err.status, Some(500));
    assert_eq!(err.message, "Đã xảy ra lỗi, vui lòng thử lại sau");
}

#[tokio::test]
async fn test_configured_fallback_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/posts"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let settings = ApiSettings {
        fallback_message: "Please try again later".to_string(),
        ..settings_for(&server)
    };
    let base_query = HttpBaseQuery::from_settings(&settings).unwrap();
    let err = base_query.execute(RequestDescriptor::get("posts")).await.unwrap_err();

    assert_eq!(err.message, "Please try again later");
}

#[tokio::test]
async fn test_arc_forwards() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let shared: Arc<dyn BaseQuery> =
        Arc::new(HttpBaseQuery::from_settings(&settings_for(&server)).unwrap());
    let response = shared.execute(RequestDescriptor::get("posts")).await.unwrap();
    assert_eq!(response.body, json!([]));
}
