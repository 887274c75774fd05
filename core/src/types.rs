//! Domain DTOs for the blog API.
//!
//! # Design
//! These types mirror the upstream JSON schema (camelCase keys) and are
//! defined independently of the mock-server crate; integration tests catch
//! any drift between the two. Everything here is immutable once fetched.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u32,
    pub user_id: u32,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u32,
    pub post_id: u32,
    pub name: String,
    pub email: String,
    pub body: String,
}

/// A post's author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub username: String,
    pub email: String,
}

/// One slice of a client-side paginated collection, with the size of the
/// whole collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostsPage {
    pub posts: Vec<Post>,
    pub total: usize,
}

/// A page of posts together with the page coordinates that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostsData {
    pub posts: Vec<Post>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

impl PostsData {
    /// Whether a later page can still hold posts.
    pub fn has_next_page(&self) -> bool {
        (self.page as usize).saturating_mul(self.limit as usize) < self.total
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostWithComments {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// `{data, error}` view of an [`ApiResult`] for presentation code.
///
/// Exactly one side is populated; the other serializes as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEnvelope<T> {
    result: ApiResult<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn data(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.result.as_ref().err()
    }

    pub fn into_result(self) -> ApiResult<T> {
        self.result
    }
}

impl<T> From<ApiResult<T>> for ApiEnvelope<T> {
    fn from(result: ApiResult<T>) -> Self {
        Self { result }
    }
}

impl<T: Serialize> Serialize for ApiEnvelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiEnvelope", 2)?;
        state.serialize_field("data", &self.data())?;
        state.serialize_field("error", &self.error())?;
        state.end()
    }
}
