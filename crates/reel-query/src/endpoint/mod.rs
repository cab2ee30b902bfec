//! Endpoint declarations and the request recipes stored with cache entries

use std::fmt;
use std::sync::Arc;

use reel_core::error::NormalizedError;
use reel_core::types::{RequestDescriptor, Tag};
use serde_json::Value;

/// Whether an endpoint reads (cached) or writes (never cached)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Query,
    Mutation,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointKind::Query => f.write_str("query"),
            EndpointKind::Mutation => f.write_str("mutation"),
        }
    }
}

/// Tags computed from the arguments and the outcome of a request
pub type TagFn<A> =
    Arc<dyn Fn(&A, Option<&Value>, Option<&NormalizedError>) -> Vec<Tag> + Send + Sync>;

/// Provided tags for a query, invalidated tags for a mutation
pub enum TagSpec<A> {
    Fixed(Vec<Tag>),
    Computed(TagFn<A>),
}

impl<A> TagSpec<A> {
    pub fn resolve(
        &self,
        args: &A,
        result: Option<&Value>,
        error: Option<&NormalizedError>,
    ) -> Vec<Tag> {
        match self {
            TagSpec::Fixed(tags) => tags.clone(),
            TagSpec::Computed(compute) => compute(args, result, error),
        }
    }
}

impl<A> Clone for TagSpec<A> {
    fn clone(&self) -> Self {
        match self {
            TagSpec::Fixed(tags) => TagSpec::Fixed(tags.clone()),
            TagSpec::Computed(compute) => TagSpec::Computed(Arc::clone(compute)),
        }
    }
}

impl<A> fmt::Debug for TagSpec<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagSpec::Fixed(tags) => f.debug_tuple("Fixed").field(tags).finish(),
            TagSpec::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

pub(crate) type RequestFn<A> = Arc<dyn Fn(&A) -> RequestDescriptor + Send + Sync>;

/// Declaration of one endpoint, generic over its argument type.
///
/// ```ignore
/// let get_post = EndpointDefinition::query("getPost", |id: &i64| {
///     RequestDescriptor::get(format!("posts/{}", id))
/// })
/// .provides_tags_with(|id, _, _| vec![Tag::with_id("Posts", *id)]);
/// ```
pub struct EndpointDefinition<A> {
    pub(crate) name: String,
    pub(crate) kind: EndpointKind,
    pub(crate) request: RequestFn<A>,
    pub(crate) tags: TagSpec<A>,
}

impl<A> EndpointDefinition<A> {
    fn new<F>(name: impl Into<String>, kind: EndpointKind, request: F) -> Self
    where
        F: Fn(&A) -> RequestDescriptor + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            request: Arc::new(request),
            tags: TagSpec::Fixed(Vec::new()),
        }
    }

    pub fn query<F>(name: impl Into<String>, request: F) -> Self
    where
        F: Fn(&A) -> RequestDescriptor + Send + Sync + 'static,
    {
        Self::new(name, EndpointKind::Query, request)
    }

    pub fn mutation<F>(name: impl Into<String>, request: F) -> Self
    where
        F: Fn(&A) -> RequestDescriptor + Send + Sync + 'static,
    {
        Self::new(name, EndpointKind::Mutation, request)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn tags(&self) -> &TagSpec<A> {
        &self.tags
    }

    /// Build the request for one set of arguments
    pub fn request(&self, args: &A) -> RequestDescriptor {
        (self.request)(args)
    }

    /// Fixed tags attached to every result of this query
    pub fn provides_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags = TagSpec::Fixed(tags.into_iter().collect());
        self
    }

    pub fn provides_tags_with<F>(mut self, compute: F) -> Self
    where
        F: Fn(&A, Option<&Value>, Option<&NormalizedError>) -> Vec<Tag> + Send + Sync + 'static,
    {
        self.tags = TagSpec::Computed(Arc::new(compute));
        self
    }

    /// Fixed tags invalidated whenever this mutation completes
    pub fn invalidates_tags(self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.provides_tags(tags)
    }

    pub fn invalidates_tags_with<F>(self, compute: F) -> Self
    where
        F: Fn(&A, Option<&Value>, Option<&NormalizedError>) -> Vec<Tag> + Send + Sync + 'static,
    {
        self.provides_tags_with(compute)
    }
}

impl<A> fmt::Debug for EndpointDefinition<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("tags", &self.tags)
            .finish()
    }
}

type RecipeTagFn = Arc<dyn Fn(Option<&Value>, Option<&NormalizedError>) -> Vec<Tag> + Send + Sync>;

/// Everything needed to (re)issue a request without the original caller:
/// the descriptor plus a tag function with the arguments already bound
#[derive(Clone)]
pub struct Recipe {
    endpoint: String,
    request: RequestDescriptor,
    tags: RecipeTagFn,
}

impl Recipe {
    /// Recipe that produces no tags
    pub fn new(endpoint: impl Into<String>, request: RequestDescriptor) -> Self {
        Self {
            endpoint: endpoint.into(),
            request,
            tags: Arc::new(|_, _| Vec::new()),
        }
    }

    /// Recipe for `args` against a declared endpoint
    pub fn for_endpoint<A>(definition: &EndpointDefinition<A>, args: A) -> Self
    where
        A: Send + Sync + 'static,
    {
        let request = definition.request(&args);
        let spec = definition.tags.clone();
        Self {
            endpoint: definition.name.clone(),
            request,
            tags: Arc::new(move |result, error| spec.resolve(&args, result, error)),
        }
    }

    pub fn with_tags<F>(mut self, compute: F) -> Self
    where
        F: Fn(Option<&Value>, Option<&NormalizedError>) -> Vec<Tag> + Send + Sync + 'static,
    {
        self.tags = Arc::new(compute);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    /// Tags for an outcome, duplicates removed
    pub fn tags(&self, result: Option<&Value>, error: Option<&NormalizedError>) -> Vec<Tag> {
        let mut tags = (self.tags)(result, error);
        tags.sort();
        tags.dedup();
        tags
    }
}

impl fmt::Debug for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipe")
            .field("endpoint", &self.endpoint)
            .field("request", &self.request)
            .finish()
    }
}
