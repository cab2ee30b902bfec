//! Configuration for the ReelNet API client
//!
//! This crate loads `reel.toml` files and `REEL_*` environment variables into
//! a validated [`ClientConfig`], and installs the tracing subscriber used by
//! the other crates.

pub mod logging;
pub mod merge;
pub mod settings;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource};
pub use settings::{ApiSettings, AuthSettings, CacheSettings, ClientConfig, LogSettings};

use reel_core::error::ReelError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ReelError>;
