//! Subscription handles held by callers of the registry

use std::marker::PhantomData;

use reel_core::error::NormalizedError;
use reel_core::types::CacheKey;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::entry::{QueryState, QueryStatus, Snapshot};
use crate::registry::Api;

/// Interest in one cache entry. Dropping it releases the subscriber count.
#[derive(Debug)]
pub struct Subscription {
    api: Api,
    key: CacheKey,
    entry_id: u64,
    receiver: watch::Receiver<Snapshot>,
}

impl Subscription {
    pub(crate) fn new(
        api: Api,
        key: CacheKey,
        entry_id: u64,
        receiver: watch::Receiver<Snapshot>,
    ) -> Self {
        Self {
            api,
            key,
            entry_id,
            receiver,
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Latest published state
    pub fn current(&self) -> Snapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next state change. `None` once the entry has been removed.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until no request is in flight for this entry
    pub async fn settled(&mut self) -> Snapshot {
        loop {
            let snapshot = self.receiver.borrow_and_update().clone();
            if snapshot.is_settled() {
                return snapshot;
            }
            if self.receiver.changed().await.is_err() {
                return Self::closed(snapshot);
            }
        }
    }

    /// Entry removed (by a reset) before its request finished
    fn closed(mut snapshot: Snapshot) -> Snapshot {
        snapshot.status = QueryStatus::Rejected;
        snapshot.is_fetching = false;
        snapshot.error = Some(NormalizedError::cancelled(
            "The cache entry was removed before its request completed",
        ));
        snapshot
    }

    /// Refetch this entry, or attach to the request already running
    pub fn refetch(&self) -> bool {
        self.api.refetch(&self.key)
    }

    /// Release now instead of at drop
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.api.release(&self.key, Some(self.entry_id));
    }
}

/// [`Subscription`] that decodes entry data into `R`
#[derive(Debug)]
pub struct QuerySubscription<R> {
    inner: Subscription,
    _marker: PhantomData<fn() -> R>,
}

impl<R: DeserializeOwned> QuerySubscription<R> {
    pub(crate) fn new(inner: Subscription) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &CacheKey {
        self.inner.key()
    }

    pub fn current(&self) -> QueryState<R> {
        QueryState::from_snapshot(&self.inner.current())
    }

    pub async fn changed(&mut self) -> Option<QueryState<R>> {
        self.inner
            .changed()
            .await
            .map(|snapshot| QueryState::from_snapshot(&snapshot))
    }

    pub async fn settled(&mut self) -> QueryState<R> {
        QueryState::from_snapshot(&self.inner.settled().await)
    }

    pub fn refetch(&self) -> bool {
        self.inner.refetch()
    }

    /// Untyped snapshot, including tags and timestamps
    pub fn snapshot(&self) -> Snapshot {
        self.inner.current()
    }

    pub fn into_inner(self) -> Subscription {
        self.inner
    }
}
