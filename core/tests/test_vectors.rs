//! Verify pagination against the JSON test vectors in `test-vectors/`.
//!
//! Each vector gives an upstream collection size, a page request, and the
//! expected slice and total. Every case is checked twice: against
//! `paginate` directly, and through `BlogService` over HTTP against a mock
//! server seeded with that many posts.

use blog_core::{paginate, BlogService, ClientConfig, PageRequest, Post};
use mock_server::{AppState, Fixtures};

struct Case {
    name: String,
    upstream_count: u32,
    request: PageRequest,
    expected_ids: Vec<u32>,
    expected_total: usize,
}

fn cases() -> Vec<Case> {
    let raw = include_str!("../../test-vectors/pagination.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    vectors["cases"]
        .as_array()
        .unwrap()
        .iter()
        .map(|case| Case {
            name: case["name"].as_str().unwrap().to_string(),
            upstream_count: case["upstream_count"].as_u64().unwrap() as u32,
            request: PageRequest::new(
                case["page"].as_u64().unwrap() as u32,
                case["limit"].as_u64().unwrap() as u32,
            ),
            expected_ids: serde_json::from_value(case["expected_ids"].clone()).unwrap(),
            expected_total: case["expected_total"].as_u64().unwrap() as usize,
        })
        .collect()
}

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

fn fixtures(count: u32) -> Fixtures {
    let mut fixtures = Fixtures::seeded();
    fixtures.posts.retain(|p| p.id <= count);
    fixtures
}

#[test]
fn paginate_test_vectors() {
    for case in cases() {
        let page = paginate(posts(case.upstream_count), case.request);
        let ids: Vec<u32> = page.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, case.expected_ids, "{}: ids", case.name);
        assert_eq!(page.total, case.expected_total, "{}: total", case.name);
    }
}

#[tokio::test]
async fn service_test_vectors() {
    for case in cases() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = AppState::new(fixtures(case.upstream_count));
        tokio::spawn(mock_server::serve(listener, state));

        let config = ClientConfig::new(&format!("http://{addr}"));
        let service = BlogService::from_config(&config).unwrap();
        let page = service.get_all_posts(case.request).await.unwrap();
        let ids: Vec<u32> = page.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, case.expected_ids, "{}: ids", case.name);
        assert_eq!(page.total, case.expected_total, "{}: total", case.name);
    }
}
