//! Scripted in-memory `Transport` for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{ApiError, ApiResult};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

pub(crate) const BASE_URL: &str = "http://api.test";

/// Answers requests from per-route scripts and records every call.
///
/// Routes are the path plus query string, e.g. `/posts?userId=1`. Scripted
/// results for a route are consumed in order; the last one repeats. Routes
/// without a script fail with a network error.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<ApiResult<HttpResponse>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push(&self, route: &str, result: ApiResult<HttpResponse>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_default()
            .push_back(result);
    }

    pub(crate) fn ok(&self, route: &str, body: serde_json::Value) {
        self.status(route, 200, &body.to_string());
    }

    pub(crate) fn status(&self, route: &str, status: u16, body: &str) {
        self.push(
            route,
            Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }),
        );
    }

    pub(crate) fn fail(&self, route: &str, err: ApiError) {
        self.push(route, Err(err));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, route: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == route).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let full = request.full_url();
        let route = full.strip_prefix(BASE_URL).unwrap_or(&full).to_string();
        self.calls.lock().unwrap().push(route.clone());

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&route) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| Err(ApiError::network())),
            None => Err(ApiError::network()),
        }
    }
}

/// JSON for `count` posts with ids from 1, all owned by `user_id`.
pub(crate) fn posts_json(count: u32, user_id: u32) -> serde_json::Value {
    let posts: Vec<serde_json::Value> = (1..=count)
        .map(|id| {
            serde_json::json!({
                "id": id,
                "userId": user_id,
                "title": format!("Post {id}"),
                "body": format!("Body {id}"),
            })
        })
        .collect();
    serde_json::Value::Array(posts)
}

pub(crate) fn post_json(id: u32, user_id: u32) -> serde_json::Value {
    serde_json::json!({"id": id, "userId": user_id, "title": format!("Post {id}"), "body": "Body"})
}

pub(crate) fn comments_json(post_id: u32, count: u32) -> serde_json::Value {
    let comments: Vec<serde_json::Value> = (1..=count)
        .map(|id| {
            serde_json::json!({
                "id": id,
                "postId": post_id,
                "name": format!("Comment {id}"),
                "email": "reader@example.com",
                "body": "Nice post",
            })
        })
        .collect();
    serde_json::Value::Array(comments)
}

pub(crate) fn user_json(id: u32, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "username": name.to_lowercase().replace(' ', "."),
        "email": "author@example.com",
    })
}
