//! # reel-core
//!
//! Core types and utilities shared across all ReelNet client crates.
//!
//! This crate provides:
//! - Tag, RequestDescriptor and CacheKey types used by the endpoint registry
//! - NormalizedError, the single error shape surfaced to callers of the cache
//! - ReelError enum for setup and programming errors
//! - Canonical JSON and fingerprint helpers for cache keys
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Tag, RequestDescriptor, CacheKey)
//! - `error`: Error types and result aliases
//! - `utils`: Canonicalization and hashing helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{ErrorKind, NormalizedError, ReelError, ReelResult};
pub use types::{CacheKey, Method, RequestDescriptor, Tag, TagId};
