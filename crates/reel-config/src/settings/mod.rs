//! Typed client configuration with defaults and validation

use std::time::Duration;

use reel_core::error::ReelError;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigResult;

/// Message shown when the server does not supply one
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Đã xảy ra lỗi, vui lòng thử lại sau";

/// Log levels accepted by `log.level`
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// REST backend settings
    pub api: ApiSettings,

    /// Query cache settings
    pub cache: CacheSettings,

    /// Hosted identity provider settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSettings>,

    /// Logging settings
    pub log: LogSettings,
}

/// REST backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Backend origin, e.g. `https://api.reelnet.app`
    pub base_url: String,

    /// Fixed path prefix appended to the base URL
    pub prefix: String,

    /// Per-request timeout on the HTTP client
    pub timeout_ms: u64,

    /// Localized message used when the server supplies none
    pub fallback_message: String,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            prefix: "/api/v1".to_string(),
            timeout_ms: 30_000,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            user_agent: concat!("reelnet-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base URL joined with the prefix, without a trailing slash
    pub fn root(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.prefix.trim_matches('/')
        )
        .trim_end_matches('/')
        .to_string()
    }
}

/// Query cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Idle window before an entry with no subscribers is evicted
    pub keep_unused_for_secs: u64,

    /// Registry-level budget for one request; unset means no budget
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            keep_unused_for_secs: 60,
            request_timeout_ms: None,
        }
    }
}

impl CacheSettings {
    pub fn keep_unused_for(&self) -> Duration {
        Duration::from_secs(self.keep_unused_for_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Hosted identity provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Tenant domain, e.g. `reelnet.eu.auth0.com`
    pub domain: String,

    /// Public client id of the application
    pub client_id: String,

    /// Where the provider redirects after login
    pub callback_url: String,

    /// API audience requested for access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// One of trace, debug, info, warn, error
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ClientConfig {
    /// Validate every section
    pub fn validate(&self) -> ConfigResult<()> {
        let base = Url::parse(&self.api.base_url).map_err(|e| {
            ReelError::invalid_config("api.base_url", format!("not a valid URL: {}", e))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ReelError::invalid_config(
                "api.base_url",
                format!("unsupported scheme '{}'", base.scheme()),
            ));
        }

        if !self.api.prefix.is_empty() && !self.api.prefix.starts_with('/') {
            return Err(ReelError::invalid_config("api.prefix", "must start with '/'"));
        }

        if self.api.timeout_ms == 0 {
            return Err(ReelError::invalid_config("api.timeout_ms", "must be greater than zero"));
        }

        if self.api.fallback_message.trim().is_empty() {
            return Err(ReelError::invalid_config("api.fallback_message", "must not be blank"));
        }

        if self.cache.request_timeout_ms == Some(0) {
            return Err(ReelError::invalid_config(
                "cache.request_timeout_ms",
                "must be greater than zero when set",
            ));
        }

        if let Some(auth) = &self.auth {
            auth.validate()?;
        }

        if !LOG_LEVELS.contains(&self.log.level.to_ascii_lowercase().as_str()) {
            return Err(ReelError::invalid_config(
                "log.level",
                format!("expected one of {}", LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }
}

impl AuthSettings {
    /// Validate domain, client id and callback url
    pub fn validate(&self) -> ConfigResult<()> {
        if self.domain.trim().is_empty() || self.domain.contains('/') {
            return Err(ReelError::invalid_config(
                "auth.domain",
                "must be a bare host name such as tenant.auth0.com",
            ));
        }
        if self.client_id.trim().is_empty() {
            return Err(ReelError::invalid_config("auth.client_id", "must not be empty"));
        }
        Url::parse(&self.callback_url).map_err(|e| {
            ReelError::invalid_config("auth.callback_url", format!("not a valid URL: {}", e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
