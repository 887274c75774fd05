//! The cached queries the reader's screens run.
//!
//! Each method pairs a [`QueryKey`] with the `BlogService` call that fills
//! it, so screens share cached results and get retry and revalidation for
//! free. Data contracts are the service's; only caching is added.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::join_all;

use crate::config::QueryConfig;
use crate::error::ApiResult;
use crate::pagination::PageRequest;
use crate::query::{QueryClient, QueryKey};
use crate::service::BlogService;
use crate::types::{Comment, Post, PostWithComments, PostsData, User};

/// Shown wherever an author's name could not be loaded.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

#[derive(Debug, Clone)]
pub struct BlogQueries {
    service: Arc<BlogService>,
    client: Arc<QueryClient>,
}

impl BlogQueries {
    pub fn new(service: BlogService, config: QueryConfig) -> Self {
        Self::with_client(Arc::new(service), Arc::new(QueryClient::new(config)))
    }

    /// Share an existing cache, e.g. between several screens.
    pub fn with_client(service: Arc<BlogService>, client: Arc<QueryClient>) -> Self {
        Self { service, client }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn service(&self) -> &BlogService {
        &self.service
    }

    pub async fn posts(&self, page: PageRequest) -> ApiResult<Arc<PostsData>> {
        let service = self.service.clone();
        let key = QueryKey::Posts {
            page: page.page(),
            limit: page.limit(),
        };
        self.client
            .fetch(key, move || {
                let service = service.clone();
                async move {
                    let result = service.get_all_posts(page).await?;
                    Ok(PostsData {
                        posts: result.posts,
                        total: result.total,
                        page: page.page(),
                        limit: page.limit(),
                    })
                }
            })
            .await
    }

    pub async fn post_with_comments(&self, post_id: u32) -> ApiResult<Arc<PostWithComments>> {
        let service = self.service.clone();
        self.client
            .fetch(QueryKey::PostWithComments(post_id), move || {
                let service = service.clone();
                async move { service.get_post_with_comments(post_id).await }
            })
            .await
    }

    /// Author of a post. A `user_id` of 0 means "not known yet" and resolves
    /// to `None` without a request.
    pub async fn author(&self, user_id: u32) -> ApiResult<Option<Arc<User>>> {
        if user_id == 0 {
            return Ok(None);
        }
        let service = self.service.clone();
        let user = self
            .client
            .fetch(QueryKey::Author(user_id), move || {
                let service = service.clone();
                async move { service.get_user_by_id(user_id).await }
            })
            .await?;
        Ok(Some(user))
    }

    /// Every post by `user_id` as a single page.
    pub async fn posts_by_user(&self, user_id: u32) -> ApiResult<Arc<PostsData>> {
        let service = self.service.clone();
        self.client
            .fetch(QueryKey::PostsByUser(user_id), move || {
                let service = service.clone();
                async move {
                    let result = service
                        .get_posts_by_user(user_id, PageRequest::new(1, u32::MAX))
                        .await?;
                    let limit = u32::try_from(result.total).unwrap_or(u32::MAX);
                    Ok(PostsData {
                        posts: result.posts,
                        total: result.total,
                        page: 1,
                        limit,
                    })
                }
            })
            .await
    }

    pub async fn post_comments(&self, post_id: u32) -> ApiResult<Arc<Vec<Comment>>> {
        let service = self.service.clone();
        self.client
            .fetch(QueryKey::PostComments(post_id), move || {
                let service = service.clone();
                async move { service.get_post_comments(post_id).await }
            })
            .await
    }

    /// Display names for the authors of `posts`, one request per distinct
    /// author, run concurrently. Authors that fail to load map to
    /// [`UNKNOWN_AUTHOR`].
    pub async fn author_names(&self, posts: &[Post]) -> HashMap<u32, String> {
        let user_ids: BTreeSet<u32> = posts.iter().map(|p| p.user_id).collect();
        let names = join_all(user_ids.into_iter().map(|user_id| async move {
            let name = match self.author(user_id).await {
                Ok(Some(user)) => user.name.clone(),
                _ => UNKNOWN_AUTHOR.to_string(),
            };
            (user_id, name)
        }))
        .await;
        names.into_iter().collect()
    }

    /// Number of comments on each of `posts`. Posts whose comments fail to
    /// load count as zero.
    pub async fn comment_counts(&self, posts: &[Post]) -> HashMap<u32, usize> {
        let counts = join_all(posts.iter().map(|post| async move {
            let count = self.post_comments(post.id).await.map_or(0, |c| c.len());
            (post.id, count)
        }))
        .await;
        counts.into_iter().collect()
    }
}
