//! # reel-query
//!
//! Endpoint registry and normalized cache for the ReelNet API client.
//!
//! Endpoints are declared once on an [`ApiBuilder`], which hands back typed
//! accessors. Query results are cached by endpoint name and canonical
//! arguments, shared between concurrent callers, and kept fresh through tag
//! invalidation: each query provides tags, each mutation invalidates tags,
//! and every cached entry carrying an invalidated tag is refetched (when
//! subscribed) or dropped (when not).
//!
//! ```ignore
//! let mut builder = ApiBuilder::new(HttpBaseQuery::from_settings(&config.api)?)
//!     .config(CacheConfig::from_settings(&config))
//!     .tag_types(["Posts"]);
//! let get_posts = builder.query::<(), Vec<Post>>(
//!     EndpointDefinition::query("getPosts", |_| RequestDescriptor::get("posts"))
//!         .provides_tags([Tag::of("Posts")]),
//! )?;
//! let api = builder.build();
//!
//! let mut posts = get_posts.subscribe(&api, &())?;
//! let state = posts.settled().await;
//! ```

pub mod accessor;
pub mod config;
pub mod endpoint;
pub mod entry;
pub mod registry;
pub mod subscription;

// Re-export main types
pub use accessor::{MutationEndpoint, QueryEndpoint};
pub use config::CacheConfig;
pub use endpoint::{EndpointDefinition, EndpointKind, Recipe, TagSpec};
pub use entry::{QueryState, QueryStatus, Snapshot};
pub use registry::{Api, ApiBuilder, CacheStats};
pub use subscription::{QuerySubscription, Subscription};
