//! Typed operations over the blog API.
//!
//! `BlogService` is an explicitly constructed value: build one per upstream
//! and hand it to whoever needs it. Every operation returns an `ApiResult`;
//! errors from the transport client pass through unchanged. There are no
//! retries here, that policy belongs to the query layer.

use tracing::debug;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{paginate, PageRequest};
use crate::types::{Comment, Post, PostWithComments, PostsPage, User};

#[derive(Debug, Clone)]
pub struct BlogService {
    api: ApiClient,
}

impl BlogService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn from_config(config: &ClientConfig) -> ApiResult<Self> {
        Ok(Self::new(ApiClient::from_config(config)?))
    }

    /// Fetch every post and return `page` of it with the full count.
    ///
    /// The upstream `/posts` endpoint cannot paginate, so the whole
    /// collection is fetched for each page.
    pub async fn get_all_posts(&self, page: PageRequest) -> ApiResult<PostsPage> {
        let posts: Vec<Post> = self.api.get("/posts", &[]).await?;
        Ok(paginate(posts, page))
    }

    pub async fn get_post_by_id(&self, id: u32) -> ApiResult<Post> {
        self.api.get(&format!("/posts/{id}"), &[]).await
    }

    /// Comments on one post. A post without comments yields an empty list.
    pub async fn get_post_comments(&self, post_id: u32) -> ApiResult<Vec<Comment>> {
        self.api.get(&format!("/posts/{post_id}/comments"), &[]).await
    }

    /// Like [`get_all_posts`](Self::get_all_posts), filtered upstream by
    /// author.
    pub async fn get_posts_by_user(&self, user_id: u32, page: PageRequest) -> ApiResult<PostsPage> {
        let posts: Vec<Post> = self.api.get("/posts", &[("userId", user_id.to_string())]).await?;
        Ok(paginate(posts, page))
    }

    pub async fn get_user_by_id(&self, id: u32) -> ApiResult<User> {
        self.api.get(&format!("/users/{id}"), &[]).await
    }

    /// Fetch a post and its comments concurrently.
    ///
    /// The post is the primary resource: if it fails, that error is returned
    /// as soon as it settles and the comments request is dropped without
    /// being awaited. A comments failure is only reported once the post has
    /// succeeded.
    pub async fn get_post_with_comments(&self, post_id: u32) -> ApiResult<PostWithComments> {
        // Comments never short-circuit the join; their result is inspected
        // only after the post is in hand.
        let comments = async { Ok::<_, ApiError>(self.get_post_comments(post_id).await) };
        let (post, comments) = tokio::try_join!(self.get_post_by_id(post_id), comments)?;
        let comments = comments?;
        debug!(post_id, comments = comments.len(), "loaded post with comments");
        Ok(PostWithComments { post, comments })
    }
}
