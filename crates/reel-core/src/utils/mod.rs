//! Utility functions shared across ReelNet client crates.
//!
//! This module provides canonical JSON rendering and Blake3 fingerprints
//! used to derive stable cache keys.

pub mod canonical;
pub mod hash;
