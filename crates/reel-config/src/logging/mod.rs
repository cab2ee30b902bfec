//! Tracing subscriber setup driven by [`LogSettings`]

use reel_core::error::ReelError;
use tracing_subscriber::EnvFilter;

use crate::settings::LogSettings;
use crate::ConfigResult;

/// Crates whose events are enabled at the configured level
const CLIENT_TARGETS: [&str; 6] = [
    "reel_core",
    "reel_config",
    "reel_auth",
    "reel_http",
    "reel_query",
    "reel_posts",
];

/// Build the filter for the client crates.
///
/// `RUST_LOG` wins when it is set and valid.
pub fn build_filter(settings: &LogSettings) -> ConfigResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = settings.level.to_ascii_lowercase();
    let directives = CLIENT_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");

    EnvFilter::try_new(format!("warn,{}", directives))
        .map_err(|e| ReelError::invalid_config("log.level", e.to_string()))
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` when another subscriber was installed first.
pub fn init(settings: &LogSettings) -> ConfigResult<bool> {
    let filter = build_filter(settings)?;

    let installed = if settings.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_ok()
    };

    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_mentions_every_crate() {
        std::env::remove_var("RUST_LOG");
        let settings = LogSettings {
            level: "debug".to_string(),
            json: false,
        };

        let filter = build_filter(&settings).unwrap().to_string();

        for target in CLIENT_TARGETS {
            assert!(filter.contains(&format!("{}=debug", target)), "{}", filter);
        }
    }

    #[test]
    fn test_build_filter_rejects_garbage_level() {
        std::env::remove_var("RUST_LOG");
        let settings = LogSettings {
            level: "verbose".to_string(),
            json: false,
        };

        assert!(build_filter(&settings).is_err());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let settings = LogSettings::default();
        let _ = init(&settings).unwrap();
        assert!(!init(&settings).unwrap());
    }
}
