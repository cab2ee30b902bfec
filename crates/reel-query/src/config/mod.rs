//! Cache behaviour settings

use std::time::Duration;

use reel_config::settings::DEFAULT_FALLBACK_MESSAGE;
use reel_config::ClientConfig;

/// Settings for one [`Api`](crate::Api)
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// How long an entry with no subscribers stays before eviction
    pub keep_unused_for: Duration,
    /// Budget for a single request; `None` leaves it to the transport
    pub request_timeout: Option<Duration>,
    /// Message attached to errors produced by the cache itself
    pub fallback_message: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            keep_unused_for: Duration::from_secs(60),
            request_timeout: None,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl CacheConfig {
    pub fn from_settings(config: &ClientConfig) -> Self {
        Self {
            keep_unused_for: config.cache.keep_unused_for(),
            request_timeout: config.cache.request_timeout(),
            fallback_message: config.api.fallback_message.clone(),
        }
    }

    pub fn keep_unused_for(mut self, window: Duration) -> Self {
        self.keep_unused_for = window;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}
