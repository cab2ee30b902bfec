//! Posts feature module for the ReelNet API client
//!
//! Declares the posts endpoints on an [`ApiBuilder`](reel_query::ApiBuilder)
//! and provides [`base_api`], the registry setup shared by every feature.

pub mod api;
pub mod base;
pub mod types;

// Re-export main types
pub use api::PostsApi;
pub use base::{base_api, TAG_TYPES};
pub use types::{CreatePost, Post, PostPatch, UpdatePost};
