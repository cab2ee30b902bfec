//! Core data types for the ReelNet API client.
//!
//! This module provides the fundamental types used by the registry:
//! - Tags linking queries to the mutations that affect them
//! - Request descriptors for HTTP calls
//! - Cache keys derived from endpoint names and canonical arguments

pub mod key;
pub mod request;
pub mod tag;

// Re-export all public types
pub use key::CacheKey;
pub use request::{Method, RequestDescriptor};
pub use tag::{intersects, Tag, TagId};
