//! Integration tests using a mock HTTP server
//!
//! Exercises the full end-to-end flow: HttpStream hooks → request
//! construction → retry/backoff → pagination → parsed records.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wirepull::auth::TokenAuthenticator;
use wirepull::http::{
    ApiBudgetConfig, BackoffPolicy, HttpClient, HttpClientConfig, HttpResponse, RequestCache,
};
use wirepull::stream::{HttpStream, RequestContext, StreamReader, SubstreamSlicer, PARENT_KEY};
use wirepull::types::{JsonValue, Method, PageToken, StreamState, StringMap};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// A realistic cursor-paginated stream
// ============================================================================

/// `GET /v1/orders?starting_after=<id>` with `Retry-After` honored on 429
struct OrdersStream {
    base: String,
}

impl BackoffPolicy for OrdersStream {
    fn max_retries(&self) -> Option<u32> {
        Some(2)
    }

    fn retry_factor(&self) -> f64 {
        0.01
    }

    fn backoff_time(&self, response: &HttpResponse) -> Option<Duration> {
        response.retry_after()
    }
}

#[async_trait]
impl HttpStream for OrdersStream {
    fn name(&self) -> &str {
        "orders"
    }

    fn url_base(&self) -> String {
        self.base.clone()
    }

    fn path(&self, _ctx: &RequestContext) -> String {
        "/v1/orders".to_string()
    }

    fn request_params(&self, ctx: &RequestContext) -> StringMap {
        let mut params = StringMap::new();
        params.insert("limit".to_string(), "2".to_string());
        if let Some(token) = &ctx.next_page_token {
            if let Some(after) = token.get("starting_after").and_then(JsonValue::as_str) {
                params.insert("starting_after".to_string(), after.to_string());
            }
        }
        params
    }

    fn request_headers(&self, _ctx: &RequestContext) -> StringMap {
        let mut headers = StringMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers
    }

    async fn next_page_token(&self, response: &HttpResponse) -> wirepull::Result<Option<PageToken>> {
        let body = response.json().unwrap_or(JsonValue::Null);
        if body.get("has_more").and_then(JsonValue::as_bool) != Some(true) {
            return Ok(None);
        }
        let last_id = body
            .get("data")
            .and_then(JsonValue::as_array)
            .and_then(|data| data.last())
            .and_then(|order| order.get("id"))
            .and_then(JsonValue::as_str);
        Ok(last_id.map(|id| {
            let mut token = PageToken::new();
            token.insert("starting_after".to_string(), json!(id));
            token
        }))
    }

    async fn parse_response(
        &self,
        response: &HttpResponse,
        _ctx: &RequestContext,
    ) -> wirepull::Result<Vec<JsonValue>> {
        let body = response.json().unwrap_or(JsonValue::Null);
        Ok(body
            .get("data")
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

async fn mount_order_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/orders"))
        .and(query_param("starting_after", "ord_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "ord_3"}],
            "has_more": false
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "ord_1"}, {"id": "ord_2"}],
            "has_more": true
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_paginated_read() {
    init_tracing();
    let server = MockServer::start().await;
    mount_order_pages(&server).await;

    let reader = StreamReader::new(OrdersStream { base: server.uri() }, HttpClient::new());
    let records = reader.read_all(None, StreamState::new()).await.unwrap();

    assert_eq!(
        records,
        vec![
            json!({"id": "ord_1"}),
            json!({"id": "ord_2"}),
            json!({"id": "ord_3"})
        ]
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_authenticated_read_sends_bearer_header() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/orders"))
        .and(header("Authorization", "Bearer sk_test_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "ord_1"}],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        HttpClient::new().with_authenticator(Arc::new(TokenAuthenticator::new("sk_test_123")));
    let reader = StreamReader::new(OrdersStream { base: server.uri() }, client);
    let records = reader.read_all(None, StreamState::new()).await.unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_retry_after_header_drives_backoff() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/orders"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("retry-after", "0"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "ord_1"}],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let reader = StreamReader::new(OrdersStream { base: server.uri() }, HttpClient::new());
    let started = std::time::Instant::now();
    let records = reader.read_all(None, StreamState::new()).await.unwrap();

    assert_eq!(records.len(), 1);
    // Retry-After of 0 still sleeps the extra fixed second
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_exhausted_retries_surface_last_status() {
    init_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "maintenance window"
        })))
        .expect(3) // 1 initial + max_retries(2)
        .mount(&server)
        .await;

    let reader = StreamReader::new(OrdersStream { base: server.uri() }, HttpClient::new());
    let err = reader.read_all(None, StreamState::new()).await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(err.to_string(), "HTTP 503: maintenance window");
}

#[tokio::test]
async fn test_substream_reads_one_slice_per_parent_record() {
    init_tracing();
    let server = MockServer::start().await;
    mount_order_pages(&server).await;

    let cache = RequestCache::new();
    let client = HttpClient::new().with_cache(cache.clone());
    let parent = StreamReader::new(OrdersStream { base: server.uri() }, client);
    let slicer = SubstreamSlicer::new(parent);

    let slices = slicer.stream_slices().await.unwrap();
    assert_eq!(slices.len(), 3);
    for (slice, id) in slices.iter().zip(["ord_1", "ord_2", "ord_3"]) {
        assert_eq!(slice.get(PARENT_KEY), Some(&json!({"id": id})));
    }

    // A second pass over the parent is served from the shared cache
    let before = server.received_requests().await.unwrap().len();
    slicer.stream_slices().await.unwrap();
    let after = server.received_requests().await.unwrap().len();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_client_with_api_budget_still_reads() {
    init_tracing();
    let server = MockServer::start().await;
    mount_order_pages(&server).await;

    let config = HttpClientConfig::builder()
        .api_budget(ApiBudgetConfig::per_second(100))
        .user_agent("wirepull-tests/0.1")
        .build();
    let client = HttpClient::with_config(config);
    assert!(client.has_api_budget());

    let reader = StreamReader::new(OrdersStream { base: server.uri() }, client);
    let records = reader.read_all(None, StreamState::new()).await.unwrap();
    assert_eq!(records.len(), 3);
}

#[tokio::test]
async fn test_post_stream_sends_json_body() {
    init_tracing();
    let server = MockServer::start().await;

    struct SearchStream {
        base: String,
    }

    impl BackoffPolicy for SearchStream {}

    #[async_trait]
    impl HttpStream for SearchStream {
        fn name(&self) -> &str {
            "search"
        }

        fn url_base(&self) -> String {
            self.base.clone()
        }

        fn path(&self, _ctx: &RequestContext) -> String {
            "/search".to_string()
        }

        fn http_method(&self) -> Method {
            Method::POST
        }

        fn request_body_json(&self, ctx: &RequestContext) -> Option<JsonValue> {
            let cursor = ctx
                .stream_state
                .get("cursor")
                .cloned()
                .unwrap_or(JsonValue::Null);
            Some(json!({"query": "status:open", "cursor": cursor}))
        }

        async fn next_page_token(
            &self,
            _response: &HttpResponse,
        ) -> wirepull::Result<Option<PageToken>> {
            Ok(None)
        }

        async fn parse_response(
            &self,
            response: &HttpResponse,
            _ctx: &RequestContext,
        ) -> wirepull::Result<Vec<JsonValue>> {
            Ok(response
                .json()
                .and_then(|body| body.get("hits").and_then(JsonValue::as_array).cloned())
                .unwrap_or_default())
        }
    }

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(wiremock::matchers::body_json(json!({
            "query": "status:open",
            "cursor": "abc"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": [{"id": 7}]})))
        .expect(1)
        .mount(&server)
        .await;

    let mut state = StreamState::new();
    state.insert("cursor".to_string(), json!("abc"));

    let reader = StreamReader::new(SearchStream { base: server.uri() }, HttpClient::new());
    let records = reader.read_all(None, state).await.unwrap();
    assert_eq!(records, vec![json!({"id": 7})]);
}
