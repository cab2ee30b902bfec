//! ReelNet client benchmarking suite
//!
//! Benchmarks for cache-key canonicalization, cache hits and invalidation
//! fan-out, and error normalization.

pub mod common;

pub use common::*;
