//! Common utilities for benchmarks

use async_trait::async_trait;
use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use reel_core::error::NormalizedError;
use reel_core::types::{RequestDescriptor, Tag};
use reel_http::{BaseQuery, RawResponse};
use reel_query::{Api, ApiBuilder, EndpointDefinition, QueryEndpoint};
use serde_json::{json, Value};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// Backend that answers every request at once with the same body
pub struct StaticBackend {
    body: Value,
}

impl StaticBackend {
    pub fn new(body: Value) -> Self {
        Self { body }
    }
}

#[async_trait]
impl BaseQuery for StaticBackend {
    async fn execute(&self, _: RequestDescriptor) -> Result<RawResponse, NormalizedError> {
        Ok(RawResponse::new(200, self.body.clone()))
    }
}

/// `count` posts in the backend's wire shape
pub fn sample_posts(count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|id| {
                json!({
                    "id": id,
                    "title": format!("Post {}", id),
                    "content": "Lorem ipsum dolor sit amet",
                    "userId": id % 7
                })
            })
            .collect(),
    )
}

/// Registry with a single `getPost` endpoint over a [`StaticBackend`]
pub fn post_api(body: Value) -> anyhow::Result<(Api, QueryEndpoint<i64, Value>)> {
    let mut builder = ApiBuilder::new(StaticBackend::new(body)).tag_types(["Posts"]);
    let get_post = builder.query(
        EndpointDefinition::query("getPost", |id: &i64| {
            RequestDescriptor::get(format!("posts/{}", id))
        })
        .provides_tags_with(|id, _, _| vec![Tag::with_id("Posts", *id)]),
    )?;
    Ok((builder.build(), get_post))
}
