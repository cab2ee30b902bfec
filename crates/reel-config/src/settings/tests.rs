//! Unit tests for client settings

use super::*;

fn auth() -> AuthSettings {
    AuthSettings {
        domain: "reelnet.eu.auth0.com".to_string(),
        client_id: "abc123".to_string(),
        callback_url: "http://localhost:3000/callback".to_string(),
        audience: None,
    }
}

#[test]
fn test_defaults() {
    let config = ClientConfig::default();

    assert_eq!(config.api.prefix, "/api/v1");
    assert_eq!(config.api.fallback_message, DEFAULT_FALLBACK_MESSAGE);
    assert_eq!(config.api.timeout(), Duration::from_secs(30));
    assert_eq!(config.cache.keep_unused_for(), Duration::from_secs(60));
    assert!(config.cache.request_timeout().is_none());
    assert!(config.auth.is_none());
    assert_eq!(config.log.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_root_joins_base_and_prefix() {
    let mut api = ApiSettings::default();
    api.base_url = "https://api.reelnet.app/".to_string();
    assert_eq!(api.root(), "https://api.reelnet.app/api/v1");

    api.prefix = String::new();
    assert_eq!(api.root(), "https://api.reelnet.app");
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config: ClientConfig = toml::from_str(
        r#"
[api]
base_url = "https://api.reelnet.app"

[cache]
keep_unused_for_secs = 5
"#,
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://api.reelnet.app");
    assert_eq!(config.api.prefix, "/api/v1");
    assert_eq!(config.cache.keep_unused_for_secs, 5);
    assert_eq!(config.log, LogSettings::default());
}

#[test]
fn test_invalid_base_url() {
    let mut config = ClientConfig::default();
    config.api.base_url = "not a url".to_string();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ReelError::ConfigValidation { ref field, .. } if field == "api.base_url"));
}

#[test]
fn test_unsupported_scheme() {
    let mut config = ClientConfig::default();
    config.api.base_url = "ftp://files.reelnet.app".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_prefix_must_be_absolute() {
    let mut config = ClientConfig::default();
    config.api.prefix = "api/v1".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_timeouts_rejected() {
    let mut config = ClientConfig::default();
    config.api.timeout_ms = 0;
    assert!(config.validate().is_err());

    let mut config = ClientConfig::default();
    config.cache.request_timeout_ms = Some(0);
    assert!(config.validate().is_err());
}

#[test]
fn test_auth_validation() {
    let mut config = ClientConfig::default();
    config.auth = Some(auth());
    assert!(config.validate().is_ok());

    let mut bad = auth();
    bad.domain = "https://reelnet.eu.auth0.com/".to_string();
    assert!(bad.validate().is_err());

    let mut bad = auth();
    bad.client_id = " ".to_string();
    assert!(bad.validate().is_err());

    let mut bad = auth();
    bad.callback_url = "/callback".to_string();
    assert!(bad.validate().is_err());
}

#[test]
fn test_log_level_validation() {
    let mut config = ClientConfig::default();
    config.log.level = "DEBUG".to_string();
    assert!(config.validate().is_ok());

    config.log.level = "verbose".to_string();
    assert!(config.validate().is_err());
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn root_never_ends_with_slash(
            host in "[a-z]{1,10}",
            trailing in "/{0,3}",
            prefix in "/{0,2}[a-z0-9/]{0,12}",
        ) {
            let api = ApiSettings {
                base_url: format!("http://{}.test{}", host, trailing),
                prefix,
                ..ApiSettings::default()
            };

            let root = api.root();
            prop_assert!(!root.ends_with('/'));
            let expected_base = format!("http://{}.test", host);
            prop_assert!(root.starts_with(&expected_base));
        }
    }
}
