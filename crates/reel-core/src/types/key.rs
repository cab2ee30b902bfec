//! Cache keys for query results

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};
use crate::utils::canonical::canonicalize;
use crate::utils::hash::key_fingerprint;

/// Identity of one cached query result: endpoint name plus canonical arguments.
///
/// Equality and hashing use the fingerprint only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheKey {
    endpoint: String,
    args: String,
    fingerprint: String,
}

impl CacheKey {
    /// Build a key from an endpoint name and any serializable arguments
    pub fn new<A: Serialize + ?Sized>(endpoint: &str, args: &A) -> ReelResult<Self> {
        let canonical = canonicalize(args).map_err(|e| ReelError::Canonicalization {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_canonical(endpoint, canonical))
    }

    /// Build a key from arguments that are already in canonical form
    pub fn from_canonical(endpoint: &str, canonical_args: String) -> Self {
        let fingerprint = key_fingerprint(endpoint, &canonical_args);
        Self {
            endpoint: endpoint.to_string(),
            args: canonical_args,
            fingerprint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Canonical JSON form of the arguments
    pub fn args(&self) -> &str {
        &self.args
    }

    /// Blake3 hex fingerprint of endpoint and arguments
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.endpoint, self.args)
    }
}
