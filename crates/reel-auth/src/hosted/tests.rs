//! Unit tests for the hosted session

use super::*;
use std::collections::HashMap;

fn settings() -> AuthSettings {
    AuthSettings {
        domain: "reelnet.eu.auth0.com".to_string(),
        client_id: "client-123".to_string(),
        callback_url: "http://localhost:3000/callback".to_string(),
        audience: Some("https://api.reelnet.app".to_string()),
    }
}

fn profile() -> Profile {
    Profile {
        sub: "auth0|42".to_string(),
        name: Some("Linh".to_string()),
        ..Profile::default()
    }
}

fn grant(expires_in: i64) -> TokenGrant {
    TokenGrant {
        access_token: "access-token".to_string(),
        expires_in,
        token_type: "Bearer".to_string(),
    }
}

#[test]
fn test_new_session_is_loading() {
    let session = HostedSession::new(settings()).unwrap();
    assert!(session.is_loading());
    assert!(!session.is_authenticated());
}

#[test]
fn test_invalid_settings_rejected() {
    let mut bad = settings();
    bad.client_id = String::new();
    assert!(HostedSession::new(bad).is_err());
}

#[test]
fn test_login_url() {
    let session = HostedSession::new(settings()).unwrap();
    let url = session.login("/video-editor").unwrap();

    assert_eq!(url.host_str(), Some("reelnet.eu.auth0.com"));
    assert_eq!(url.path(), "/authorize");

    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["client_id"], "client-123");
    assert_eq!(query["redirect_uri"], "http://localhost:3000/callback");
    assert_eq!(query["scope"], "openid profile email");
    assert_eq!(query["audience"], "https://api.reelnet.app");
    assert_eq!(
        HostedSession::decode_return_path(&query["state"]).as_deref(),
        Some("/video-editor")
    );
}

#[test]
fn test_decode_garbage_state() {
    assert!(HostedSession::decode_return_path("%%%").is_none());
    assert!(HostedSession::decode_return_path("bm90IGpzb24").is_none());
}

#[tokio::test]
async fn test_complete_login_provides_token() {
    let session = HostedSession::new(settings()).unwrap();
    session.complete_login(grant(3600), profile());

    assert!(!session.is_loading());
    assert!(session.is_authenticated());
    assert_eq!(session.user().unwrap().sub, "auth0|42");
    assert_eq!(session.get_token().await.as_deref(), Some("access-token"));
}

#[tokio::test]
async fn test_expired_token_yields_none() {
    let session = HostedSession::new(settings()).unwrap();
    // Inside the leeway window counts as expired
    session.complete_login(grant(10), profile());

    assert!(session.is_authenticated());
    assert!(session.get_token().await.is_none());
}

#[tokio::test]
async fn test_out_of_range_lifetime_counts_as_expired() {
    let session = HostedSession::new(settings()).unwrap();
    session.complete_login(grant(i64::MAX), profile());

    assert!(session.is_authenticated());
    assert!(session.get_token().await.is_none());

    session.complete_login(grant(i64::MIN), profile());
    assert!(session.get_token().await.is_none());
}

#[tokio::test]
async fn test_negative_lifetime_counts_as_expired() {
    let session = HostedSession::new(settings()).unwrap();
    session.complete_login(grant(-3600), profile());

    assert!(session.is_authenticated());
    assert!(session.get_token().await.is_none());
}

#[tokio::test]
async fn test_logout_clears_state() {
    let session = HostedSession::new(settings()).unwrap();
    session.complete_login(grant(3600), profile());

    let url = session.logout().unwrap();
    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

    assert_eq!(url.path(), "/v2/logout");
    assert_eq!(query["returnTo"], "http://localhost:3000");
    assert_eq!(query["client_id"], "client-123");
    assert!(!session.is_authenticated());
    assert!(session.get_token().await.is_none());
}

#[test]
fn test_mark_anonymous() {
    let session = HostedSession::new(settings()).unwrap();
    session.mark_anonymous();
    assert!(!session.is_loading());
    assert!(!session.is_authenticated());
}

#[test]
fn test_token_grant_default_type() {
    let grant: TokenGrant =
        serde_json::from_str(r#"{"access_token":"abc","expires_in":86400}"#).unwrap();
    assert_eq!(grant.token_type, "Bearer");
}
