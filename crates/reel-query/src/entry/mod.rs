//! Cache entry state and the views handed to subscribers

use chrono::{DateTime, Utc};
use reel_core::error::NormalizedError;
use reel_core::types::Tag;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::endpoint::Recipe;

/// Lifecycle of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Uninitialized,
    Pending,
    Fulfilled,
    Rejected,
}

/// Point-in-time view of one cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub status: QueryStatus,
    /// Last successful result; kept through refetches and failures
    pub data: Option<Value>,
    /// Error of the latest completed request, cleared by a success
    pub error: Option<NormalizedError>,
    /// A request for this entry is in flight
    pub is_fetching: bool,
    /// Invalidated or refreshed since the data was stored
    pub is_stale: bool,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub provided_tags: Vec<Tag>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            is_fetching: false,
            is_stale: false,
            fulfilled_at: None,
            provided_tags: Vec::new(),
        }
    }

    /// No data yet and a request is pending
    pub fn is_loading(&self) -> bool {
        self.data.is_none()
            && matches!(self.status, QueryStatus::Uninitialized | QueryStatus::Pending)
    }

    /// The latest request has completed
    pub fn is_settled(&self) -> bool {
        !self.is_fetching && matches!(self.status, QueryStatus::Fulfilled | QueryStatus::Rejected)
    }
}

/// Typed view of a cache entry: `{data, error, is_loading}` plus fetch flags
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<R> {
    pub data: Option<R>,
    pub error: Option<NormalizedError>,
    pub status: QueryStatus,
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_stale: bool,
}

impl<R: DeserializeOwned> QueryState<R> {
    /// Decode the snapshot's data; a decode failure is reported as a
    /// serialization error in place of the data
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut error = snapshot.error.clone();
        let data = match &snapshot.data {
            Some(value) => match R::deserialize(value) {
                Ok(data) => Some(data),
                Err(e) => {
                    error = Some(NormalizedError::serialization(format!(
                        "Response does not match the expected shape: {}",
                        e
                    )));
                    None
                }
            },
            None => None,
        };

        Self {
            data,
            error,
            status: snapshot.status,
            is_loading: snapshot.is_loading(),
            is_fetching: snapshot.is_fetching,
            is_stale: snapshot.is_stale,
        }
    }
}

impl<R> QueryState<R> {
    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Fulfilled && self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Error first, so a rejected entry with old data reports its failure
    pub fn into_result(self) -> Result<R, NormalizedError> {
        match (self.error, self.data) {
            (Some(error), _) => Err(error),
            (None, Some(data)) => Ok(data),
            (None, None) => Err(NormalizedError::cancelled("No data available for this query")),
        }
    }
}

/// One cached query result, owned by the registry
pub(crate) struct CacheEntry {
    /// Distinguishes this entry from a later one under the same key
    pub(crate) id: u64,
    pub(crate) recipe: Recipe,
    pub(crate) status: QueryStatus,
    pub(crate) data: Option<Value>,
    pub(crate) error: Option<NormalizedError>,
    pub(crate) subscribers: usize,
    pub(crate) provided_tags: Vec<Tag>,
    pub(crate) stale: bool,
    pub(crate) in_flight: bool,
    pub(crate) refetch_queued: bool,
    pub(crate) fulfilled_at: Option<DateTime<Utc>>,
    /// Request currently owning the entry; older completions are ignored
    pub(crate) request_id: u64,
    /// Bumped on every subscribe and release; pending evictions compare it
    pub(crate) generation: u64,
    tx: watch::Sender<Snapshot>,
}

impl CacheEntry {
    pub(crate) fn new(id: u64, recipe: Recipe) -> Self {
        let (tx, _) = watch::channel(Snapshot::empty());
        Self {
            id,
            recipe,
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            subscribers: 0,
            provided_tags: Vec::new(),
            stale: false,
            in_flight: false,
            refetch_queued: false,
            fulfilled_at: None,
            request_id: 0,
            generation: 0,
            tx,
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.in_flight,
            is_stale: self.stale,
            fulfilled_at: self.fulfilled_at,
            provided_tags: self.provided_tags.clone(),
        }
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Push the current state to every subscriber
    pub(crate) fn publish(&self) {
        self.tx.send_replace(self.snapshot());
    }

    /// Served from cache without a request
    pub(crate) fn is_hit(&self) -> bool {
        !self.stale && matches!(self.status, QueryStatus::Fulfilled | QueryStatus::Rejected)
    }

    pub(crate) fn complete(&mut self, outcome: Result<Value, NormalizedError>, tags: Vec<Tag>) {
        self.in_flight = false;
        self.stale = false;
        self.provided_tags = tags;
        match outcome {
            Ok(data) => {
                self.status = QueryStatus::Fulfilled;
                self.data = Some(data);
                self.error = None;
                self.fulfilled_at = Some(Utc::now());
            }
            Err(error) => {
                self.status = QueryStatus::Rejected;
                self.error = Some(error);
            }
        }
    }
}
