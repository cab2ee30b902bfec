//! Blake3 hashing utilities for cache-key fingerprints.

/// Compute Blake3 hash of data as lowercase hex
pub fn blake3_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    hash.to_hex().to_string()
}

/// Fingerprint an endpoint name together with its canonical arguments.
///
/// The two parts are length-prefixed so that `("ab", "c")` and `("a", "bc")`
/// never collide.
pub fn key_fingerprint(endpoint: &str, canonical_args: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(endpoint.len() as u64).to_le_bytes());
    hasher.update(endpoint.as_bytes());
    hasher.update(&(canonical_args.len() as u64).to_le_bytes());
    hasher.update(canonical_args.as_bytes());
    hasher.finalize().to_hex().to_string()
}
