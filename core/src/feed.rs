//! Infinite-scroll accumulation of the post list.
//!
//! `PostFeed` walks the paginated posts query one page at a time and keeps
//! every post loaded so far, the way the reader's home list grows as the
//! user scrolls. A failed page leaves the feed unchanged so the same page
//! can be retried.

use tracing::debug;

use crate::error::ApiResult;
use crate::pagination::{PageRequest, DEFAULT_LIMIT};
use crate::query::QueryKey;
use crate::queries::BlogQueries;
use crate::types::Post;

#[derive(Debug)]
pub struct PostFeed {
    queries: BlogQueries,
    next: PageRequest,
    posts: Vec<Post>,
    total: Option<usize>,
    exhausted: bool,
}

impl PostFeed {
    pub fn new(queries: BlogQueries) -> Self {
        Self::with_limit(queries, DEFAULT_LIMIT)
    }

    pub fn with_limit(queries: BlogQueries, limit: u32) -> Self {
        Self {
            queries,
            next: PageRequest::new(1, limit),
            posts: Vec::new(),
            total: None,
            exhausted: false,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Size of the upstream collection, known after the first page.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// Page the next `load_more` will request.
    pub fn next_page(&self) -> u32 {
        self.next.page()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Load the next page and append it. Returns how many posts were added;
    /// once the feed is exhausted this is always 0 and no request is made.
    pub async fn load_more(&mut self) -> ApiResult<usize> {
        if self.exhausted {
            return Ok(0);
        }

        let data = self.queries.posts(self.next).await?;
        let added = data.posts.len();
        self.posts.extend(data.posts.iter().cloned());
        self.total = Some(data.total);
        self.next = self.next.next();
        self.exhausted = added == 0 || self.posts.len() >= data.total;

        debug!(
            page = data.page,
            added,
            loaded = self.posts.len(),
            total = data.total,
            "feed page loaded"
        );
        Ok(added)
    }

    /// Drop everything loaded, invalidate cached pages and load page 1 again.
    pub async fn refresh(&mut self) -> ApiResult<usize> {
        self.queries
            .client()
            .invalidate_matching(|key| matches!(key, QueryKey::Posts { .. }));
        self.next = PageRequest::new(1, self.next.limit());
        self.posts.clear();
        self.total = None;
        self.exhausted = false;
        self.load_more().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::ApiClient;
    use crate::config::QueryConfig;
    use crate::error::ApiError;
    use crate::service::BlogService;
    use crate::testing::{posts_json, ScriptedTransport, BASE_URL};

    fn feed(transport: &Arc<ScriptedTransport>, limit: u32) -> PostFeed {
        let config = QueryConfig {
            retry: 0,
            ..QueryConfig::default()
        };
        let service = BlogService::new(ApiClient::new(BASE_URL, transport.clone()));
        PostFeed::with_limit(BlogQueries::new(service, config), limit)
    }

    #[tokio::test]
    async fn accumulates_pages_until_total() {
        let transport = ScriptedTransport::new();
        transport.ok("/posts", posts_json(25, 1));
        let mut feed = feed(&transport, 10);

        assert_eq!(feed.load_more().await.unwrap(), 10);
        assert_eq!(feed.total(), Some(25));
        assert_eq!(feed.load_more().await.unwrap(), 10);
        assert_eq!(feed.load_more().await.unwrap(), 5);
        assert!(feed.is_exhausted());
        assert_eq!(feed.load_more().await.unwrap(), 0);

        let ids: Vec<u32> = feed.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, (1..=25).collect::<Vec<_>>());
        assert_eq!(transport.calls_to("/posts"), 3);
    }

    #[tokio::test]
    async fn empty_collection_exhausts_immediately() {
        let transport = ScriptedTransport::new();
        transport.ok("/posts", serde_json::json!([]));
        let mut feed = feed(&transport, 10);

        assert_eq!(feed.load_more().await.unwrap(), 0);
        assert!(feed.is_exhausted());
        assert_eq!(feed.total(), Some(0));
    }

    #[tokio::test]
    async fn failed_page_can_be_retried() {
        let transport = ScriptedTransport::new();
        transport.ok("/posts", posts_json(15, 1));
        transport.fail("/posts", ApiError::network());
        transport.ok("/posts", posts_json(15, 1));
        let mut feed = feed(&transport, 10);

        feed.load_more().await.unwrap();
        let err = feed.load_more().await.unwrap_err();
        assert_eq!(err.message, "Network Error");
        assert_eq!(feed.next_page(), 2);
        assert_eq!(feed.posts().len(), 10);

        assert_eq!(feed.load_more().await.unwrap(), 5);
        assert!(feed.is_exhausted());
    }

    #[tokio::test]
    async fn refresh_starts_over_from_the_network() {
        let transport = ScriptedTransport::new();
        transport.ok("/posts", posts_json(30, 1));
        let mut feed = feed(&transport, 10);

        feed.load_more().await.unwrap();
        feed.load_more().await.unwrap();
        assert_eq!(feed.refresh().await.unwrap(), 10);

        assert_eq!(feed.posts().len(), 10);
        assert_eq!(feed.next_page(), 2);
        assert_eq!(transport.calls_to("/posts"), 3);
    }
}
