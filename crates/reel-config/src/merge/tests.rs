//! Unit tests for configuration layering

use super::*;
use tempfile::TempDir;

fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
}

#[tokio::test]
async fn test_defaults_when_no_files() {
    let cwd = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();

    let loader = ConfigLoader::new(utf8_dir(&cwd)).with_home(Some(utf8_dir(&home)));
    let (config, sources) = loader.load_with_env(&HashMap::new()).await.unwrap();

    assert_eq!(config, ClientConfig::default());
    assert_eq!(sources, vec![ConfigSource::Defaults]);
}

#[tokio::test]
async fn test_resolve_config_path_walks_up() {
    let root = TempDir::new().unwrap();
    let root_path = utf8_dir(&root);
    let nested = root_path.join("workspace").join("editor");
    tokio::fs::create_dir_all(&nested).await.unwrap();
    tokio::fs::write(root_path.join(PROJECT_CONFIG_FILE), "[api]\n").await.unwrap();

    let loader = ConfigLoader::new(nested).with_home(None);
    let resolved = loader.resolve_config_path(PROJECT_CONFIG_FILE).unwrap();

    assert_eq!(resolved, root_path.join(PROJECT_CONFIG_FILE));
}

#[tokio::test]
async fn test_project_overrides_global() {
    let cwd = TempDir::new().unwrap();
    let home = TempDir::new().unwrap();
    let home_path = utf8_dir(&home);

    tokio::fs::create_dir_all(home_path.join(".reel")).await.unwrap();
    tokio::fs::write(
        home_path.join(".reel").join("config.toml"),
        r#"
[api]
base_url = "https://global.reelnet.app"
timeout_ms = 5000

[log]
level = "debug"
"#,
    )
    .await
    .unwrap();

    tokio::fs::write(
        utf8_dir(&cwd).join(PROJECT_CONFIG_FILE),
        r#"
[api]
base_url = "https://project.reelnet.app"
"#,
    )
    .await
    .unwrap();

    let loader = ConfigLoader::new(utf8_dir(&cwd)).with_home(Some(home_path.clone()));
    let (config, sources) = loader.load_with_env(&HashMap::new()).await.unwrap();

    // Project wins for the key it sets
    assert_eq!(config.api.base_url, "https://project.reelnet.app");
    // Global values survive in the same table
    assert_eq!(config.api.timeout_ms, 5000);
    assert_eq!(config.log.level, "debug");
    assert_eq!(sources.len(), 3);
    assert!(matches!(sources[1], ConfigSource::Global(_)));
    assert!(matches!(sources[2], ConfigSource::Project(_)));
}

#[tokio::test]
async fn test_environment_has_highest_priority() {
    let cwd = TempDir::new().unwrap();
    tokio::fs::write(
        utf8_dir(&cwd).join(PROJECT_CONFIG_FILE),
        "[api]\nbase_url = \"https://project.reelnet.app\"\n",
    )
    .await
    .unwrap();

    let env = HashMap::from([
        ("REEL_API_URL".to_string(), "https://env.reelnet.app".to_string()),
        ("REEL_CACHE_KEEP_UNUSED_SECS".to_string(), "5".to_string()),
        ("REEL_AUTH_DOMAIN".to_string(), "reelnet.eu.auth0.com".to_string()),
        ("REEL_AUTH_CLIENT_ID".to_string(), "client".to_string()),
        ("REEL_AUTH_CALLBACK_URL".to_string(), "http://localhost:3000".to_string()),
        ("REEL_UNRELATED".to_string(), "ignored".to_string()),
    ]);

    let loader = ConfigLoader::new(utf8_dir(&cwd)).with_home(None);
    let (config, sources) = loader.load_with_env(&env).await.unwrap();

    assert_eq!(config.api.base_url, "https://env.reelnet.app");
    assert_eq!(config.cache.keep_unused_for_secs, 5);
    let auth = config.auth.unwrap();
    assert_eq!(auth.domain, "reelnet.eu.auth0.com");
    assert_eq!(auth.client_id, "client");
    assert!(sources.contains(&ConfigSource::Environment("REEL_API_URL".to_string())));
    assert!(!sources.contains(&ConfigSource::Environment("REEL_UNRELATED".to_string())));
}

#[tokio::test]
async fn test_partial_auth_from_env_fails_validation() {
    let cwd = TempDir::new().unwrap();
    let env = HashMap::from([("REEL_AUTH_DOMAIN".to_string(), "reelnet.eu.auth0.com".to_string())]);

    let loader = ConfigLoader::new(utf8_dir(&cwd)).with_home(None);
    let err = loader.load_with_env(&env).await.unwrap_err();

    assert!(matches!(err, ReelError::ConfigValidation { ref field, .. } if field == "auth.client_id"));
}

#[tokio::test]
async fn test_invalid_number_in_env() {
    let cwd = TempDir::new().unwrap();
    let env = HashMap::from([("REEL_API_TIMEOUT_MS".to_string(), "soon".to_string())]);

    let loader = ConfigLoader::new(utf8_dir(&cwd)).with_home(None);
    let err = loader.load_with_env(&env).await.unwrap_err();

    assert!(matches!(err, ReelError::ConfigValidation { ref field, .. } if field == "REEL_API_TIMEOUT_MS"));
}

#[tokio::test]
async fn test_malformed_toml_reports_path() {
    let cwd = TempDir::new().unwrap();
    let path = utf8_dir(&cwd).join(PROJECT_CONFIG_FILE);
    tokio::fs::write(&path, "[api\nbase_url = ").await.unwrap();

    let loader = ConfigLoader::new(utf8_dir(&cwd)).with_home(None);
    let err = loader.load_with_env(&HashMap::new()).await.unwrap_err();

    match err {
        ReelError::ConfigParse { path: reported, .. } => assert_eq!(reported, path.to_string()),
        other => panic!("Expected ConfigParse error, got {:?}", other),
    }
}

#[test]
fn test_merge_tables_deep() {
    let mut base: toml::Table = "[api]\nbase_url = \"a\"\ntimeout_ms = 1\n".parse().unwrap();
    let overlay: toml::Table = "[api]\nbase_url = \"b\"\n[log]\njson = true\n".parse().unwrap();

    ConfigLayering::merge_tables(&mut base, overlay);

    let api = base["api"].as_table().unwrap();
    assert_eq!(api["base_url"].as_str(), Some("b"));
    assert_eq!(api["timeout_ms"].as_integer(), Some(1));
    assert_eq!(base["log"]["json"].as_bool(), Some(true));
}

#[test]
fn test_collect_env_overrides() {
    std::env::set_var("REEL_TEST_COLLECT", "1");
    std::env::set_var("NOT_REEL_TEST_COLLECT", "1");

    let overrides = ConfigLayering::collect_env_overrides();

    assert!(overrides.contains_key("REEL_TEST_COLLECT"));
    assert!(!overrides.contains_key("NOT_REEL_TEST_COLLECT"));

    std::env::remove_var("REEL_TEST_COLLECT");
    std::env::remove_var("NOT_REEL_TEST_COLLECT");
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn table(entries: Vec<(String, i64)>) -> toml::Table {
        entries
            .into_iter()
            .map(|(key, value)| (key, toml::Value::Integer(value)))
            .collect()
    }

    proptest! {
        #[test]
        fn overlay_values_win_and_base_keys_survive(
            base in prop::collection::vec(("[a-e]{1,3}", any::<i64>()), 0..10),
            overlay in prop::collection::vec(("[a-e]{1,3}", any::<i64>()), 0..10),
        ) {
            let base = table(base);
            let overlay = table(overlay);

            let mut merged = base.clone();
            ConfigLayering::merge_tables(&mut merged, overlay.clone());

            for (key, value) in &overlay {
                prop_assert_eq!(merged.get(key), Some(value));
            }
            for (key, value) in &base {
                if !overlay.contains_key(key) {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
            prop_assert!(merged.keys().all(|key| base.contains_key(key) || overlay.contains_key(key)));
        }

        #[test]
        fn nested_sections_merge_associatively(
            a in prop::collection::vec(("[a-c]{1,2}", any::<i64>()), 0..6),
            b in prop::collection::vec(("[a-c]{1,2}", any::<i64>()), 0..6),
            c in prop::collection::vec(("[a-c]{1,2}", any::<i64>()), 0..6),
        ) {
            let wrap = |entries| {
                let mut outer = toml::Table::new();
                outer.insert("api".to_string(), toml::Value::Table(table(entries)));
                outer
            };
            let (a, b, c) = (wrap(a), wrap(b), wrap(c));

            let mut left = a.clone();
            ConfigLayering::merge_tables(&mut left, b.clone());
            ConfigLayering::merge_tables(&mut left, c.clone());

            let mut right_overlay = b;
            ConfigLayering::merge_tables(&mut right_overlay, c);
            let mut right = a;
            ConfigLayering::merge_tables(&mut right, right_overlay);

            prop_assert_eq!(left, right);
        }
    }
}
