//! API client core for the blog reader.
//!
//! # Overview
//! Fetches posts, authors and comments from a fixed JSON API and hands them
//! to presentation code as typed values. Nothing here panics or raises on a
//! failed request: every operation returns an [`ApiResult`], and every
//! failure has the same [`ApiError`] shape.
//!
//! # Layers
//! - [`client::ApiClient`]: builds GET requests, runs them through a
//!   [`transport::Transport`], and parses responses. `ReqwestTransport` is the
//!   real transport; tests script their own.
//! - [`service::BlogService`]: the typed operations, client-side pagination
//!   and the post-with-comments aggregation.
//! - [`query::QueryClient`] and [`queries::BlogQueries`]: caching, retry and
//!   revalidation around the service.
//! - [`feed::PostFeed`]: infinite-scroll accumulation of post pages.
//!
//! Nothing is global: build a service from a [`ClientConfig`] (or an
//! injected transport) and pass it to whoever needs it.

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod pagination;
pub mod queries;
pub mod query;
pub mod service;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError, QueryConfig};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use feed::PostFeed;
pub use http::{HttpRequest, HttpResponse};
pub use pagination::{paginate, PageRequest};
pub use queries::{BlogQueries, UNKNOWN_AUTHOR};
pub use query::{QueryClient, QueryKey};
pub use service::BlogService;
pub use transport::{ReqwestTransport, Transport};
pub use types::{ApiEnvelope, Comment, Post, PostWithComments, PostsData, PostsPage, User};
