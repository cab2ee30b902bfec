//! Configuration layering, file discovery, and environment overrides

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use reel_core::error::ReelError;
use tracing::{debug, info};

use crate::settings::{AuthSettings, ClientConfig};
use crate::ConfigResult;

/// File name searched for in the project directory tree
pub const PROJECT_CONFIG_FILE: &str = "reel.toml";

/// Prefix of environment variables that override configuration
pub const ENV_PREFIX: &str = "REEL_";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
    /// Home directory holding `.reel/config.toml`
    home: Option<Utf8PathBuf>,
}

/// Configuration layering and merging
pub struct ConfigLayering;

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Built-in defaults
    Defaults,
    /// Global config file
    Global(Utf8PathBuf),
    /// Project reel.toml file
    Project(Utf8PathBuf),
    /// Environment variable
    Environment(String),
}

impl ConfigLoader {
    /// Create a new configuration loader using the user's home directory
    pub fn new(cwd: Utf8PathBuf) -> Self {
        let home = dirs::home_dir().and_then(|dir| Utf8PathBuf::try_from(dir).ok());
        Self { cwd, home }
    }

    /// Override the home directory used for the global config file
    pub fn with_home(mut self, home: Option<Utf8PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Find the project config file (walks up the directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        let mut current = Some(self.cwd.as_path());

        while let Some(dir) = current {
            let candidate = dir.join(filename);
            if candidate.exists() {
                return Some(candidate);
            }
            current = dir.parent();
        }

        None
    }

    /// Path of the global config file, whether or not it exists
    pub fn global_config_path(&self) -> Option<Utf8PathBuf> {
        self.home
            .as_ref()
            .map(|home| home.join(".reel").join("config.toml"))
    }

    /// Load defaults, global file, project file and process environment
    pub async fn load(&self) -> ConfigResult<(ClientConfig, Vec<ConfigSource>)> {
        self.load_with_env(&ConfigLayering::collect_env_overrides()).await
    }

    /// Load all layers using the given environment overrides
    pub async fn load_with_env(
        &self,
        env_overrides: &HashMap<String, String>,
    ) -> ConfigResult<(ClientConfig, Vec<ConfigSource>)> {
        let mut sources = vec![ConfigSource::Defaults];
        let mut merged = toml::Table::new();

        if let Some(path) = self.global_config_path() {
            if path.exists() {
                let table = load_table(&path).await?;
                ConfigLayering::merge_tables(&mut merged, table);
                sources.push(ConfigSource::Global(path));
            }
        }

        if let Some(path) = self.resolve_config_path(PROJECT_CONFIG_FILE) {
            let table = load_table(&path).await?;
            ConfigLayering::merge_tables(&mut merged, table);
            sources.push(ConfigSource::Project(path));
        }

        let mut config: ClientConfig = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ReelError::ConfigParse {
                path: PROJECT_CONFIG_FILE.to_string(),
                message: e.to_string(),
            })?;

        let applied = ConfigLayering::apply_env_overrides(&mut config, env_overrides)?;
        sources.extend(applied.into_iter().map(ConfigSource::Environment));

        config.validate()?;
        info!(
            "Loaded client configuration for {} from {} source(s)",
            config.api.root(),
            sources.len()
        );

        Ok((config, sources))
    }
}

/// Read and parse one TOML file into a table
async fn load_table(path: &Utf8Path) -> ConfigResult<toml::Table> {
    debug!("Reading configuration from {}", path);
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReelError::io(format!("Failed to read {}", path), e))?;

    content.parse::<toml::Table>().map_err(|e| ReelError::ConfigParse {
        path: path.to_string(),
        message: e.message().to_string(),
    })
}

impl ConfigLayering {
    /// Deep-merge `overlay` into `base`; overlay values win, nested tables merge
    pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
        for (key, value) in overlay {
            if let toml::Value::Table(incoming) = value {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    Self::merge_tables(existing, incoming);
                    continue;
                }
                base.insert(key, toml::Value::Table(incoming));
            } else {
                base.insert(key, value);
            }
        }
    }

    /// Apply environment variable overrides, returning the variables used
    pub fn apply_env_overrides(
        config: &mut ClientConfig,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<Vec<String>> {
        let mut applied = Vec::new();
        let mut keys: Vec<&String> = overrides.keys().collect();
        keys.sort();

        for key in keys {
            let value = &overrides[key];
            match key.as_str() {
                "REEL_API_URL" => config.api.base_url = value.clone(),
                "REEL_API_PREFIX" => config.api.prefix = value.clone(),
                "REEL_API_TIMEOUT_MS" => config.api.timeout_ms = parse_number(key, value)?,
                "REEL_FALLBACK_MESSAGE" => config.api.fallback_message = value.clone(),
                "REEL_CACHE_KEEP_UNUSED_SECS" => {
                    config.cache.keep_unused_for_secs = parse_number(key, value)?;
                }
                "REEL_CACHE_REQUEST_TIMEOUT_MS" => {
                    config.cache.request_timeout_ms = Some(parse_number(key, value)?);
                }
                "REEL_AUTH_DOMAIN" => auth_section(config).domain = value.clone(),
                "REEL_AUTH_CLIENT_ID" => auth_section(config).client_id = value.clone(),
                "REEL_AUTH_CALLBACK_URL" => auth_section(config).callback_url = value.clone(),
                "REEL_AUTH_AUDIENCE" => auth_section(config).audience = Some(value.clone()),
                "REEL_LOG" => config.log.level = value.clone(),
                "REEL_LOG_JSON" => config.log.json = matches!(value.as_str(), "1" | "true" | "yes"),
                _ => {
                    // Unknown environment variable, ignore
                    continue;
                }
            }
            applied.push(key.clone());
        }

        Ok(applied)
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

fn auth_section(config: &mut ClientConfig) -> &mut AuthSettings {
    config.auth.get_or_insert_with(|| AuthSettings {
        domain: String::new(),
        client_id: String::new(),
        callback_url: String::new(),
        audience: None,
    })
}

fn parse_number(key: &str, value: &str) -> ConfigResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| ReelError::invalid_config(key, format!("expected a whole number: {}", e)))
}

#[cfg(test)]
mod tests;
