//! Shared registry setup for every ReelNet feature module

use std::sync::Arc;

use reel_auth::AuthSession;
use reel_config::ClientConfig;
use reel_core::error::ReelResult;
use reel_http::HttpBaseQuery;
use reel_query::{ApiBuilder, CacheConfig};
use tracing::debug;

/// Tag types known to the ReelNet API
pub const TAG_TYPES: [&str; 2] = ["Posts", "Users"];

/// Builder wired to the HTTP backend described by `config`, with the
/// ReelNet tag types declared. Feature modules register onto it.
pub fn base_api(
    config: &ClientConfig,
    session: Option<Arc<dyn AuthSession>>,
) -> ReelResult<ApiBuilder> {
    let mut base_query = HttpBaseQuery::from_settings(&config.api)?;
    if let Some(session) = session {
        base_query = base_query.with_session(session);
    }
    debug!("API root {}", config.api.root());

    Ok(ApiBuilder::new(base_query)
        .config(CacheConfig::from_settings(config))
        .tag_types(TAG_TYPES))
}
