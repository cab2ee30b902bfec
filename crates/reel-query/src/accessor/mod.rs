//! Typed accessors returned when endpoints are registered

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use reel_core::error::{NormalizedError, ReelResult};
use reel_core::types::CacheKey;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::endpoint::{EndpointDefinition, Recipe};
use crate::entry::QueryState;
use crate::registry::Api;
use crate::subscription::QuerySubscription;

/// Typed handle to a registered query endpoint
pub struct QueryEndpoint<A, R> {
    definition: Arc<EndpointDefinition<A>>,
    _marker: PhantomData<fn() -> R>,
}

impl<A, R> Clone for QueryEndpoint<A, R> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            _marker: PhantomData,
        }
    }
}

impl<A, R> fmt::Debug for QueryEndpoint<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QueryEndpoint").field(&self.definition.name).finish()
    }
}

impl<A, R> QueryEndpoint<A, R>
where
    A: Serialize + Clone + Send + Sync + 'static,
    R: DeserializeOwned,
{
    pub(crate) fn new(definition: EndpointDefinition<A>) -> Self {
        Self {
            definition: Arc::new(definition),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Cache key for `args`
    pub fn key(&self, args: &A) -> ReelResult<CacheKey> {
        CacheKey::new(&self.definition.name, args)
    }

    pub fn recipe(&self, args: &A) -> Recipe {
        Recipe::for_endpoint(&*self.definition, args.clone())
    }

    /// Subscribe to the entry for `args`, fetching it if needed
    pub fn subscribe(&self, api: &Api, args: &A) -> ReelResult<QuerySubscription<R>> {
        let subscription = api.query(self.key(args)?, self.recipe(args))?;
        Ok(QuerySubscription::new(subscription))
    }

    /// Subscribe, wait for the result, then release the subscription
    pub async fn fetch(&self, api: &Api, args: &A) -> ReelResult<QueryState<R>> {
        let mut subscription = self.subscribe(api, args)?;
        Ok(subscription.settled().await)
    }

    /// Cached state for `args` without subscribing
    pub fn cached(&self, api: &Api, args: &A) -> ReelResult<Option<QueryState<R>>> {
        let key = self.key(args)?;
        Ok(api.snapshot(&key).map(|snapshot| QueryState::from_snapshot(&snapshot)))
    }
}

/// Typed handle to a registered mutation endpoint
pub struct MutationEndpoint<A, R> {
    definition: Arc<EndpointDefinition<A>>,
    _marker: PhantomData<fn() -> R>,
}

impl<A, R> Clone for MutationEndpoint<A, R> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            _marker: PhantomData,
        }
    }
}

impl<A, R> fmt::Debug for MutationEndpoint<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutationEndpoint").field(&self.definition.name).finish()
    }
}

impl<A, R> MutationEndpoint<A, R>
where
    A: Clone + Send + Sync + 'static,
    R: DeserializeOwned,
{
    pub(crate) fn new(definition: EndpointDefinition<A>) -> Self {
        Self {
            definition: Arc::new(definition),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn recipe(&self, args: &A) -> Recipe {
        Recipe::for_endpoint(&*self.definition, args.clone())
    }

    /// Run the mutation and decode its result
    pub async fn trigger(&self, api: &Api, args: &A) -> Result<R, NormalizedError> {
        let value = api.mutate(self.recipe(args)).await?;
        R::deserialize(&value).map_err(|e| {
            NormalizedError::serialization(format!(
                "Response of '{}' does not match the expected shape: {}",
                self.definition.name, e
            ))
        })
    }
}
