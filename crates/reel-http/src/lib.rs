//! HTTP layer for the ReelNet API client
//!
//! This crate turns [`RequestDescriptor`](reel_core::RequestDescriptor)s into
//! HTTP calls against the ReelNet backend, and turns every failure into a
//! serializable [`NormalizedError`](reel_core::NormalizedError) before it
//! reaches the cache.
//!
//! - `transport`: reqwest-backed client with base URL, default headers,
//!   cookies and bearer authorization
//! - `normalize`: transport failures to `NormalizedError`
//! - `sanitize`: recursive conversion of diagnostic values into plain JSON
//! - `executor`: the `BaseQuery` seam used by the endpoint registry
//! - `retry`: optional exponential backoff around any `BaseQuery`

pub mod executor;
pub mod normalize;
pub mod retry;
pub mod sanitize;
pub mod transport;

// Re-export main types
pub use executor::{BaseQuery, HttpBaseQuery};
pub use normalize::ErrorNormalizer;
pub use retry::{RetryConfig, Retrying};
pub use sanitize::{make_serializable, DynValue, ErrorValue};
pub use transport::{HttpTransport, RawResponse, RequestContext, TransportConfig, TransportError};
