//! In-process stand-in for the upstream blog API.
//!
//! Serves the same read-only endpoints as the public API the core talks to
//! (`/posts`, `/posts/{id}`, `/posts/{id}/comments`, `/posts?userId=`,
//! `/users/{id}`) from deterministic fixture data. Unknown ids answer 404
//! with an empty JSON object, matching the real service.
//!
//! `AppState` also counts requests and can inject latency, which the core's
//! integration tests use to observe call counts and timeouts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u32,
    pub user_id: u32,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u32,
    pub post_id: u32,
    pub name: String,
    pub email: String,
    pub body: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub username: String,
    pub email: String,
}

const AUTHORS: [(&str, &str); 10] = [
    ("Leanne Graham", "Bret"),
    ("Ervin Howell", "Antonette"),
    ("Clementine Bauch", "Samantha"),
    ("Patricia Lebsack", "Karianne"),
    ("Chelsey Dietrich", "Kamren"),
    ("Dennis Schulist", "Leopoldo_Corkery"),
    ("Kurtis Weissnat", "Elwyn.Skiles"),
    ("Nicholas Runolfsdottir", "Maxime_Nienow"),
    ("Glenna Reichert", "Delphine"),
    ("Clementina DuBuque", "Moriah.Stanton"),
];

/// The data set served by the mock API.
#[derive(Clone, Debug, Default)]
pub struct Fixtures {
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    pub users: Vec<User>,
}

impl Fixtures {
    pub const POSTS_PER_USER: u32 = 10;
    pub const COMMENTS_PER_POST: u32 = 5;

    /// Ten users with ten posts each and five comments per post. Ids are
    /// sequential from 1, so post `n` belongs to user `(n - 1) / 10 + 1`.
    pub fn seeded() -> Self {
        let users: Vec<User> = AUTHORS
            .iter()
            .zip(1u32..)
            .map(|(&(name, username), id)| User {
                id,
                name: name.to_string(),
                username: username.to_string(),
                email: format!("{}@example.com", username.to_lowercase()),
            })
            .collect();

        let mut posts = Vec::new();
        let mut comments = Vec::new();
        for user in &users {
            for n in 0..Self::POSTS_PER_USER {
                let post_id = (user.id - 1) * Self::POSTS_PER_USER + n + 1;
                posts.push(Post {
                    id: post_id,
                    user_id: user.id,
                    title: format!("Post {post_id} by {}", user.username),
                    body: format!("Body of post {post_id}."),
                });
                for c in 0..Self::COMMENTS_PER_POST {
                    let comment_id = (post_id - 1) * Self::COMMENTS_PER_POST + c + 1;
                    comments.push(Comment {
                        id: comment_id,
                        post_id,
                        name: format!("Comment {comment_id}"),
                        email: format!("reader{comment_id}@example.com"),
                        body: format!("Comment {comment_id} on post {post_id}."),
                    });
                }
            }
        }

        Self { posts, comments, users }
    }
}

/// Shared handler state: fixtures plus test instrumentation.
#[derive(Clone, Debug)]
pub struct AppState {
    fixtures: Arc<Fixtures>,
    hits: Arc<AtomicUsize>,
    latency: Option<Duration>,
}

impl AppState {
    pub fn new(fixtures: Fixtures) -> Self {
        Self {
            fixtures: Arc::new(fixtures),
            hits: Arc::new(AtomicUsize::new(0)),
            latency: None,
        }
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of requests served so far, across all clones of this state.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    async fn record(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

pub fn app() -> Router {
    router(AppState::new(Fixtures::seeded()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/{id}", get(get_post))
        .route("/posts/{id}/comments", get(list_comments))
        .route("/users/{id}", get(get_user))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, AppState::new(Fixtures::seeded())).await
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<u32>,
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({}))).into_response()
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> Json<Vec<Post>> {
    state.record().await;
    let posts = state
        .fixtures
        .posts
        .iter()
        .filter(|p| query.user_id.map_or(true, |uid| p.user_id == uid))
        .cloned()
        .collect();
    Json(posts)
}

async fn get_post(State(state): State<AppState>, Path(id): Path<u32>) -> Response {
    state.record().await;
    match state.fixtures.posts.iter().find(|p| p.id == id) {
        Some(post) => Json(post.clone()).into_response(),
        None => {
            tracing::debug!(id, "post not found");
            not_found()
        }
    }
}

async fn list_comments(State(state): State<AppState>, Path(id): Path<u32>) -> Json<Vec<Comment>> {
    state.record().await;
    let comments = state
        .fixtures
        .comments
        .iter()
        .filter(|c| c.post_id == id)
        .cloned()
        .collect();
    Json(comments)
}

async fn get_user(State(state): State<AppState>, Path(id): Path<u32>) -> Response {
    state.record().await;
    match state.fixtures.users.iter().find(|u| u.id == id) {
        Some(user) => Json(user.clone()).into_response(),
        None => {
            tracing::debug!(id, "user not found");
            not_found()
        }
    }
}
