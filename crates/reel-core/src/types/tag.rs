//! Cache tags used to connect queries with the mutations that affect them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier narrowing a tag to one resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagId {
    /// Numeric id, e.g. a database primary key
    Int(i64),
    /// String id, e.g. a slug or uuid
    Str(String),
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagId::Int(id) => write!(f, "{}", id),
            TagId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for TagId {
    fn from(id: i64) -> Self {
        TagId::Int(id)
    }
}

impl From<i32> for TagId {
    fn from(id: i32) -> Self {
        TagId::Int(i64::from(id))
    }
}

impl From<u32> for TagId {
    fn from(id: u32) -> Self {
        TagId::Int(i64::from(id))
    }
}

impl From<&str> for TagId {
    fn from(id: &str) -> Self {
        TagId::Str(id.to_string())
    }
}

impl From<String> for TagId {
    fn from(id: String) -> Self {
        TagId::Str(id)
    }
}

/// A label attached to cached results and referenced by mutations.
///
/// A tag without an id covers every resource of its type. Matching is
/// symmetric: `Posts` matches `Posts:5`, and `Posts:5` matches `Posts`,
/// but `Posts:5` does not match `Posts:6`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    /// Tag type, e.g. `"Posts"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional resource id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TagId>,
}

impl Tag {
    /// Tag covering every resource of a type
    pub fn of(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    /// Tag for one resource of a type
    pub fn with_id(kind: impl Into<String>, id: impl Into<TagId>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.into()),
        }
    }

    /// Whether this tag covers every resource of its type
    pub fn is_type_wide(&self) -> bool {
        self.id.is_none()
    }

    /// Whether invalidating one of these tags affects data carrying the other
    pub fn matches(&self, other: &Tag) -> bool {
        if self.kind != other.kind {
            return false;
        }
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => f.write_str(&self.kind),
        }
    }
}

/// Whether any provided tag matches any invalidated tag
pub fn intersects<'a, P>(provided: P, invalidated: &[Tag]) -> bool
where
    P: IntoIterator<Item = &'a Tag>,
{
    provided
        .into_iter()
        .any(|tag| invalidated.iter().any(|other| tag.matches(other)))
}
