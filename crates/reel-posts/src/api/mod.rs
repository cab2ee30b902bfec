//! Posts endpoints

use reel_core::error::ReelResult;
use reel_core::types::{RequestDescriptor, Tag};
use reel_query::{ApiBuilder, EndpointDefinition, MutationEndpoint, QueryEndpoint};
use serde::de::IgnoredAny;
use serde_json::Value;

use crate::types::{CreatePost, Post, UpdatePost};

pub const POSTS: &str = "Posts";

/// Typed accessors for the posts endpoints
#[derive(Debug, Clone)]
pub struct PostsApi {
    /// `GET posts`, provides `Posts`
    pub get_posts: QueryEndpoint<(), Vec<Post>>,
    /// `GET posts/{id}`, provides `Posts:{id}`
    pub get_post: QueryEndpoint<i64, Post>,
    /// `POST posts`, invalidates `Posts`
    pub create_post: MutationEndpoint<CreatePost, Post>,
    /// `PATCH posts/{id}`, invalidates `Posts:{id}`
    pub update_post: MutationEndpoint<UpdatePost, Post>,
    /// `DELETE posts/{id}`, invalidates `Posts`
    pub delete_post: MutationEndpoint<i64, IgnoredAny>,
}

impl PostsApi {
    pub fn register(builder: &mut ApiBuilder) -> ReelResult<Self> {
        let get_posts = builder.query(
            EndpointDefinition::query("getPosts", |_: &()| RequestDescriptor::get("posts"))
                .provides_tags([Tag::of(POSTS)]),
        )?;

        let get_post = builder.query(
            EndpointDefinition::query("getPost", |id: &i64| {
                RequestDescriptor::get(format!("posts/{}", id))
            })
            .provides_tags_with(|id, _, _| vec![Tag::with_id(POSTS, *id)]),
        )?;

        let create_post = builder.mutation(
            EndpointDefinition::mutation("createPost", |post: &CreatePost| {
                RequestDescriptor::post("posts").body(to_body(post))
            })
            .invalidates_tags([Tag::of(POSTS)]),
        )?;

        let update_post = builder.mutation(
            EndpointDefinition::mutation("updatePost", |update: &UpdatePost| {
                RequestDescriptor::patch(format!("posts/{}", update.id)).body(to_body(&update.patch))
            })
            .invalidates_tags_with(|update, _, _| vec![Tag::with_id(POSTS, update.id)]),
        )?;

        let delete_post = builder.mutation(
            EndpointDefinition::mutation("deletePost", |id: &i64| {
                RequestDescriptor::delete(format!("posts/{}", id))
            })
            .invalidates_tags([Tag::of(POSTS)]),
        )?;

        Ok(Self {
            get_posts,
            get_post,
            create_post,
            update_post,
            delete_post,
        })
    }
}

/// Plain data structs always serialize
fn to_body<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
