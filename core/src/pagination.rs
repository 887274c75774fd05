//! Client-side pagination.
//!
//! The upstream API returns whole collections, so pages are cut locally:
//! page `p` of size `l` is `items[(p - 1) * l .. (p - 1) * l + l]`, clipped to
//! the collection. A page past the end is empty, not an error, and `total`
//! always reports the size of the whole collection.

use crate::types::{Post, PostsPage};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// One-based page number and page size. Both are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Zero page numbers and sizes are raised to 1.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        ((self.page - 1) as usize).saturating_mul(self.limit as usize)
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            limit: self.limit,
        }
    }
}

/// Cut `request`'s page out of the full `posts` collection.
pub fn paginate(posts: Vec<Post>, request: PageRequest) -> PostsPage {
    let total = posts.len();
    let start = request.offset().min(total);
    let len = (request.limit() as usize).min(total - start);
    let posts = posts.into_iter().skip(start).take(len).collect();
    PostsPage { posts, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts(count: u32) -> Vec<Post> {
        (1..=count)
            .map(|id| Post {
                id,
                user_id: 1,
                title: format!("Post {id}"),
                body: String::new(),
            })
            .collect()
    }

    fn ids(page: &PostsPage) -> Vec<u32> {
        page.posts.iter().map(|p| p.id).collect()
    }

    #[test]
    fn first_page() {
        let page = paginate(posts(25), PageRequest::default());
        assert_eq!(ids(&page), (1..=10).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
    }

    #[test]
    fn partial_last_page() {
        let page = paginate(posts(25), PageRequest::new(3, 10));
        assert_eq!(ids(&page), vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
    }

    #[test]
    fn page_past_the_end_is_empty_with_total() {
        let page = paginate(posts(25), PageRequest::new(4, 10));
        assert!(page.posts.is_empty());
        assert_eq!(page.total, 25);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let page = paginate(posts(5), PageRequest::new(u32::MAX, u32::MAX));
        assert!(page.posts.is_empty());
        assert_eq!(page.total, 5);
    }

    #[test]
    fn empty_collection() {
        let page = paginate(Vec::new(), PageRequest::default());
        assert!(page.posts.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn zero_is_clamped_to_one() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 1);
        assert_eq!(ids(&paginate(posts(3), request)), vec![1]);
    }

    #[test]
    fn page_never_exceeds_limit() {
        for total in [0u32, 1, 9, 10, 11, 100] {
            for page in 1..=12 {
                for limit in [1u32, 3, 10, 50] {
                    let result = paginate(posts(total), PageRequest::new(page, limit));
                    assert!(result.posts.len() <= limit as usize);
                    assert_eq!(result.total, total as usize);
                }
            }
        }
    }

    #[test]
    fn next_advances_page_only() {
        let next = PageRequest::new(2, 7).next();
        assert_eq!((next.page(), next.limit()), (3, 7));
        assert_eq!(PageRequest::new(u32::MAX, 1).next().page(), u32::MAX);
    }
}
