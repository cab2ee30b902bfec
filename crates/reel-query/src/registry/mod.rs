//! Endpoint registry and normalized cache.
//!
//! All entries live in one map behind a single lock. The lock is never held
//! across an `.await`: subscriber counts, in-flight flags and staleness are
//! updated synchronously, then requests run as spawned tasks and write their
//! outcome back under the lock when they finish.
//!
//! Invariants kept by every operation:
//! - at most one request in flight per key
//! - an invalidation arriving during a request queues exactly one refetch
//! - unsubscribing never cancels a request; its result still lands in the cache
//! - entries with no subscribers are dropped on invalidation, or evicted
//!   after [`CacheConfig::keep_unused_for`]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use reel_core::error::{NormalizedError, ReelError, ReelResult};
use reel_core::types::{intersects, CacheKey, Tag};
use reel_http::BaseQuery;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::accessor::{MutationEndpoint, QueryEndpoint};
use crate::config::CacheConfig;
use crate::endpoint::{EndpointDefinition, EndpointKind, Recipe, TagSpec};
use crate::entry::{CacheEntry, QueryStatus, Snapshot};
use crate::subscription::Subscription;

/// Counters describing the cache contents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    /// Entries with at least one subscriber
    pub subscribed: usize,
    pub in_flight: usize,
    pub fulfilled: usize,
    pub rejected: usize,
    pub stale: usize,
}

/// Collects endpoint declarations and produces an [`Api`]
pub struct ApiBuilder {
    base_query: Arc<dyn BaseQuery>,
    config: CacheConfig,
    tag_types: BTreeSet<String>,
    endpoints: BTreeMap<String, EndpointKind>,
}

impl ApiBuilder {
    pub fn new<B: BaseQuery + 'static>(base_query: B) -> Self {
        Self::with_shared(Arc::new(base_query))
    }

    pub fn with_shared(base_query: Arc<dyn BaseQuery>) -> Self {
        Self {
            base_query,
            config: CacheConfig::default(),
            tag_types: BTreeSet::new(),
            endpoints: BTreeMap::new(),
        }
    }

    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Declare the tag types endpoints may provide or invalidate
    pub fn tag_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_types.extend(types.into_iter().map(Into::into));
        self
    }

    fn register<A>(
        &mut self,
        definition: &EndpointDefinition<A>,
        expected: EndpointKind,
    ) -> ReelResult<()> {
        if definition.kind != expected {
            return Err(ReelError::invalid_config(
                definition.name.clone(),
                format!("declared as a {} but registered as a {}", definition.kind, expected),
            ));
        }
        if self.endpoints.contains_key(&definition.name) {
            return Err(ReelError::DuplicateEndpoint {
                name: definition.name.clone(),
            });
        }
        if let TagSpec::Fixed(tags) = &definition.tags {
            if let Some(tag) = tags.iter().find(|tag| !self.tag_types.contains(&tag.kind)) {
                return Err(ReelError::UndeclaredTag {
                    endpoint: definition.name.clone(),
                    tag: tag.kind.clone(),
                });
            }
        }

        debug!("Registered {} '{}'", expected, definition.name);
        self.endpoints.insert(definition.name.clone(), expected);
        Ok(())
    }

    /// Register a query endpoint and get its typed accessor
    pub fn query<A, R>(&mut self, definition: EndpointDefinition<A>) -> ReelResult<QueryEndpoint<A, R>>
    where
        A: Serialize + Clone + Send + Sync + 'static,
        R: DeserializeOwned,
    {
        self.register(&definition, EndpointKind::Query)?;
        Ok(QueryEndpoint::new(definition))
    }

    /// Register a mutation endpoint and get its typed accessor
    pub fn mutation<A, R>(
        &mut self,
        definition: EndpointDefinition<A>,
    ) -> ReelResult<MutationEndpoint<A, R>>
    where
        A: Clone + Send + Sync + 'static,
        R: DeserializeOwned,
    {
        self.register(&definition, EndpointKind::Mutation)?;
        Ok(MutationEndpoint::new(definition))
    }

    pub fn build(self) -> Api {
        Api {
            inner: Arc::new(ApiInner {
                base_query: self.base_query,
                config: self.config,
                tag_types: self.tag_types,
                endpoints: self.endpoints,
                entries: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }
}

struct ApiInner {
    base_query: Arc<dyn BaseQuery>,
    config: CacheConfig,
    tag_types: BTreeSet<String>,
    endpoints: BTreeMap<String, EndpointKind>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    next_id: AtomicU64,
}

/// A request started under the lock, to be spawned once it is released
struct FetchJob {
    key: CacheKey,
    request_id: u64,
    recipe: Recipe,
}

/// Owns a spawned fetch until it completes. A task that ends early, by
/// panicking or being dropped with its runtime, still settles the entry.
struct FetchGuard {
    api: Api,
    job: Option<FetchJob>,
}

impl FetchGuard {
    fn finish(mut self, outcome: Result<Value, NormalizedError>, tags: Vec<Tag>) {
        if let Some(job) = self.job.take() {
            self.api.complete(job, outcome, tags);
        }
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            warn!("Request for {} ended without a result", job.key);
            self.api.complete(
                job,
                Err(NormalizedError::cancelled("The request ended before producing a result")),
                Vec::new(),
            );
        }
    }
}

/// Registry handle; cheap to clone, all clones share one cache.
///
/// Operations that start requests spawn tokio tasks. Outside a tokio runtime
/// those requests settle at once as cancelled.
#[derive(Clone)]
pub struct Api {
    inner: Arc<ApiInner>,
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("config", &self.inner.config)
            .field("endpoints", &self.inner.endpoints)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Api {
    pub fn builder<B: BaseQuery + 'static>(base_query: B) -> ApiBuilder {
        ApiBuilder::new(base_query)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    pub fn tag_types(&self) -> impl Iterator<Item = &str> {
        self.inner.tag_types.iter().map(String::as_str)
    }

    pub fn endpoint_kind(&self, name: &str) -> ReelResult<EndpointKind> {
        self.inner
            .endpoints
            .get(name)
            .copied()
            .ok_or_else(|| ReelError::UnknownEndpoint {
                name: name.to_string(),
            })
    }

    fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Subscribe to `key`, fetching with `recipe` unless the cache can answer.
    ///
    /// The subscriber count is incremented before this returns, so a
    /// concurrent invalidation sees this subscriber.
    pub fn query(&self, key: CacheKey, recipe: Recipe) -> ReelResult<Subscription> {
        if self.endpoint_kind(recipe.endpoint())? != EndpointKind::Query {
            return Err(ReelError::invalid_config(
                recipe.endpoint().to_string(),
                "mutations cannot be subscribed to",
            ));
        }
        if key.endpoint() != recipe.endpoint() {
            return Err(ReelError::invalid_config(
                recipe.endpoint().to_string(),
                format!("cache key belongs to endpoint '{}'", key.endpoint()),
            ));
        }

        let mut entries = self.inner.entries.lock();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(self.next_id(), recipe));

        entry.subscribers += 1;
        entry.generation += 1;
        let receiver = entry.watch();
        let entry_id = entry.id;

        let job = if entry.in_flight {
            debug!("Attaching to in-flight request for {}", key);
            None
        } else if entry.is_hit() {
            debug!("Cache hit for {}", key);
            None
        } else {
            debug!("Cache miss for {}", key);
            Some(self.begin_fetch(&key, entry))
        };
        drop(entries);

        if let Some(job) = job {
            self.spawn_fetch(job);
        }
        Ok(Subscription::new(self.clone(), key, entry_id, receiver))
    }

    /// Run a mutation. Never cached; the invalidated tags are applied on
    /// success and on failure.
    pub async fn mutate(&self, recipe: Recipe) -> Result<Value, NormalizedError> {
        debug!("Running mutation {}", recipe.endpoint());
        let outcome = self.execute(&recipe).await;
        let tags = recipe.tags(outcome.as_ref().ok(), outcome.as_ref().err());
        self.invalidate_tags(&tags);
        outcome
    }

    /// Refetch subscribed entries carrying a matching tag, drop unsubscribed ones
    pub fn invalidate_tags(&self, tags: &[Tag]) {
        if tags.is_empty() {
            return;
        }

        let mut jobs = Vec::new();
        let mut dropped = Vec::new();
        let mut entries = self.inner.entries.lock();

        for (key, entry) in entries.iter_mut() {
            if !intersects(&entry.provided_tags, tags) {
                continue;
            }
            if entry.in_flight {
                entry.refetch_queued = true;
                entry.stale = true;
                entry.publish();
            } else if entry.subscribers == 0 {
                dropped.push(key.clone());
            } else {
                entry.stale = true;
                jobs.push(self.begin_fetch(key, entry));
            }
        }
        for key in &dropped {
            entries.remove(key);
        }
        drop(entries);

        debug!(
            "Invalidated [{}]: {} refetching, {} dropped",
            tags.iter().map(Tag::to_string).collect::<Vec<_>>().join(", "),
            jobs.len(),
            dropped.len()
        );
        for job in jobs {
            self.spawn_fetch(job);
        }
    }

    /// Drop one subscriber from `key`. Extra calls are no-ops.
    pub fn unsubscribe(&self, key: &CacheKey) {
        self.release(key, None);
    }

    /// Release held by a [`Subscription`]; ignored if the entry it was
    /// created for has since been replaced
    pub(crate) fn release(&self, key: &CacheKey, entry_id: Option<u64>) {
        let mut entries = self.inner.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry_id.map_or(false, |id| id != entry.id) || entry.subscribers == 0 {
            return;
        }

        entry.subscribers -= 1;
        if entry.subscribers == 0 && !entry.in_flight {
            entry.generation += 1;
            let generation = entry.generation;
            drop(entries);
            self.schedule_eviction(key.clone(), generation);
        }
    }

    /// Manual refresh. Attaches to the in-flight request if there is one.
    /// Returns `false` when nothing is cached under `key`.
    pub fn refetch(&self, key: &CacheKey) -> bool {
        let mut entries = self.inner.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };
        if entry.in_flight {
            return true;
        }
        entry.stale = true;
        let job = self.begin_fetch(key, entry);
        drop(entries);

        self.spawn_fetch(job);
        true
    }

    pub fn snapshot(&self, key: &CacheKey) -> Option<Snapshot> {
        self.inner.entries.lock().get(key).map(CacheEntry::snapshot)
    }

    pub fn subscriber_count(&self, key: &CacheKey) -> usize {
        self.inner
            .entries
            .lock()
            .get(key)
            .map_or(0, |entry| entry.subscribers)
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.inner.entries.lock();
        entries.values().fold(
            CacheStats {
                entries: entries.len(),
                ..CacheStats::default()
            },
            |mut stats, entry| {
                stats.subscribed += usize::from(entry.subscribers > 0);
                stats.in_flight += usize::from(entry.in_flight);
                stats.stale += usize::from(entry.stale);
                match entry.status {
                    QueryStatus::Fulfilled => stats.fulfilled += 1,
                    QueryStatus::Rejected => stats.rejected += 1,
                    _ => {}
                }
                stats
            },
        )
    }

    /// Forget every entry. Requests still running finish but are discarded,
    /// and existing subscriptions see their entry closed.
    pub fn reset(&self) {
        let removed = {
            let mut entries = self.inner.entries.lock();
            let count = entries.len();
            entries.clear();
            count
        };
        debug!("Cache reset, {} entries removed", removed);
    }

    /// Mark the entry in flight and hand back the request to spawn
    fn begin_fetch(&self, key: &CacheKey, entry: &mut CacheEntry) -> FetchJob {
        entry.in_flight = true;
        entry.refetch_queued = false;
        entry.request_id = self.next_id();
        if entry.status == QueryStatus::Uninitialized || entry.data.is_none() {
            entry.status = QueryStatus::Pending;
        }
        entry.publish();

        FetchJob {
            key: key.clone(),
            request_id: entry.request_id,
            recipe: entry.recipe.clone(),
        }
    }

    fn spawn_fetch(&self, job: FetchJob) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No tokio runtime to run the request for {}", job.key);
                self.complete(
                    job,
                    Err(NormalizedError::cancelled("No runtime available to run the request")),
                    Vec::new(),
                );
                return;
            }
        };

        let api = self.clone();
        handle.spawn(async move {
            let recipe = job.recipe.clone();
            let guard = FetchGuard {
                api: api.clone(),
                job: Some(job),
            };
            let outcome = api.execute(&recipe).await;
            let tags = api.allowed_tags(
                recipe.endpoint(),
                recipe.tags(outcome.as_ref().ok(), outcome.as_ref().err()),
            );
            guard.finish(outcome, tags);
        });
    }

    /// One call through the base query, bounded by the configured timeout
    async fn execute(&self, recipe: &Recipe) -> Result<Value, NormalizedError> {
        let call = self.inner.base_query.execute(recipe.request().clone());
        let outcome = match self.inner.config.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        "{} exceeded its {}ms budget",
                        recipe.endpoint(),
                        limit.as_millis()
                    );
                    Err(NormalizedError::timeout(self.inner.config.fallback_message.clone()))
                }
            },
            None => call.await,
        };
        outcome.map(|response| response.body)
    }

    /// Computed tags may name any type; keep only the declared ones
    fn allowed_tags(&self, endpoint: &str, tags: Vec<Tag>) -> Vec<Tag> {
        tags.into_iter()
            .filter(|tag| {
                let declared = self.inner.tag_types.contains(&tag.kind);
                if !declared {
                    warn!("Endpoint '{}' provided undeclared tag {}", endpoint, tag);
                }
                declared
            })
            .collect()
    }

    fn complete(&self, job: FetchJob, outcome: Result<Value, NormalizedError>, tags: Vec<Tag>) {
        let mut entries = self.inner.entries.lock();
        let Some(entry) = entries.get_mut(&job.key) else {
            debug!("Discarding result for {}: entry no longer cached", job.key);
            return;
        };
        if entry.request_id != job.request_id {
            return;
        }

        if let Err(error) = &outcome {
            debug!("{} rejected: {}", job.key, error);
        }
        entry.complete(outcome, tags);

        if entry.refetch_queued {
            if entry.subscribers == 0 {
                debug!("Dropping {} after invalidation with no subscribers", job.key);
                entries.remove(&job.key);
                return;
            }
            entry.stale = true;
            let next = self.begin_fetch(&job.key, entry);
            drop(entries);
            self.spawn_fetch(next);
            return;
        }

        entry.publish();
        if entry.subscribers == 0 {
            entry.generation += 1;
            let generation = entry.generation;
            drop(entries);
            self.schedule_eviction(job.key, generation);
        }
    }

    /// Evict `key` after the idle window unless it was resubscribed meanwhile
    fn schedule_eviction(&self, key: CacheKey, generation: u64) {
        let window = self.inner.config.keep_unused_for;
        if window.is_zero() {
            self.evict_if_idle(&key, generation);
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let api = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep(window).await;
                    api.evict_if_idle(&key, generation);
                });
            }
            // No runtime left to wait on
            Err(_) => self.evict_if_idle(&key, generation),
        }
    }

    fn evict_if_idle(&self, key: &CacheKey, generation: u64) {
        let mut entries = self.inner.entries.lock();
        let idle = entries.get(key).map_or(false, |entry| {
            entry.generation == generation && entry.subscribers == 0 && !entry.in_flight
        });
        if idle {
            entries.remove(key);
            debug!("Evicted unused entry {}", key);
        }
    }
}
