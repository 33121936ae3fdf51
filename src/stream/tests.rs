//! Tests for the stream module

use super::*;
use crate::http::{BackoffPolicy, HttpClient, HttpResponse};
use crate::types::{JsonValue, PageToken, StreamState, StringMap};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Pages through `/items`, passing the `page` token as a query param and
/// following the `next` field of each body.
struct ItemsStream {
    base: String,
}

impl ItemsStream {
    fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl BackoffPolicy for ItemsStream {
    fn retry_factor(&self) -> f64 {
        0.01
    }
}

#[async_trait::async_trait]
impl HttpStream for ItemsStream {
    fn name(&self) -> &str {
        "items"
    }

    fn url_base(&self) -> String {
        self.base.clone()
    }

    fn path(&self, _ctx: &RequestContext) -> String {
        "items".to_string()
    }

    fn request_params(&self, ctx: &RequestContext) -> StringMap {
        let mut params = StringMap::new();
        if let Some(token) = &ctx.next_page_token {
            if let Some(page) = token.get("page").and_then(JsonValue::as_i64) {
                params.insert("page".to_string(), page.to_string());
            }
        }
        params
    }

    async fn next_page_token(&self, response: &HttpResponse) -> crate::Result<Option<PageToken>> {
        let body = response.json().unwrap_or(JsonValue::Null);
        Ok(body.get("next").and_then(JsonValue::as_i64).map(|next| {
            let mut token = PageToken::new();
            token.insert("page".to_string(), json!(next));
            token
        }))
    }

    async fn parse_response(
        &self,
        response: &HttpResponse,
        _ctx: &RequestContext,
    ) -> crate::Result<Vec<JsonValue>> {
        let body = response.json().unwrap_or(JsonValue::Null);
        Ok(body
            .get("records")
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

/// Single page, but the extracted token is an empty object
struct EmptyTokenStream {
    base: String,
}

impl BackoffPolicy for EmptyTokenStream {}

#[async_trait::async_trait]
impl HttpStream for EmptyTokenStream {
    fn name(&self) -> &str {
        "empty-token"
    }

    fn url_base(&self) -> String {
        self.base.clone()
    }

    fn path(&self, _ctx: &RequestContext) -> String {
        "items".to_string()
    }

    async fn next_page_token(&self, _response: &HttpResponse) -> crate::Result<Option<PageToken>> {
        Ok(Some(PageToken::new()))
    }

    async fn parse_response(
        &self,
        _response: &HttpResponse,
        _ctx: &RequestContext,
    ) -> crate::Result<Vec<JsonValue>> {
        Ok(vec![json!({"data": 1})])
    }
}

async fn mount_three_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"records": [{"id": 2}], "next": 2})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": [{"id": 3}]})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"records": [{"id": 1}], "next": 1})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_pagination_follows_tokens_until_none() {
    let server = MockServer::start().await;
    mount_three_pages(&server).await;

    let reader = StreamReader::new(ItemsStream::new(server.uri()), HttpClient::new());
    let records = reader.read_all(None, StreamState::new()).await.unwrap();

    assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]);
    // Token sequence [1, 2, None] means exactly 3 fetches
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_read_records_is_lazy() {
    let server = MockServer::start().await;
    mount_three_pages(&server).await;

    let reader = StreamReader::new(ItemsStream::new(server.uri()), HttpClient::new());
    let records = reader.read_records(None, StreamState::new());
    futures::pin_mut!(records);

    let first = records.next().await.unwrap().unwrap();
    assert_eq!(first, json!({"id": 1}));
    // Only the first page has been fetched so far
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_page_token_terminates_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let reader = StreamReader::new(
        EmptyTokenStream {
            base: server.uri(),
        },
        HttpClient::new(),
    );
    let records = reader.read_all(None, StreamState::new()).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_429_once_then_success_yields_one_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": [{"id": 1}]})))
        .mount(&server)
        .await;

    let reader = StreamReader::new(ItemsStream::new(server.uri()), HttpClient::new());
    let records = reader.read_all(None, StreamState::new()).await.unwrap();

    assert_eq!(records, vec![json!({"id": 1})]);
    // Exactly one retry happened
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_403_propagates_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let reader = StreamReader::new(ItemsStream::new(server.uri()), HttpClient::new());
    let err = reader.read_all(None, StreamState::new()).await.unwrap_err();

    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_hooks_receive_slice_and_state() {
    let mut state = StreamState::new();
    state.insert("cursor".to_string(), json!("2024-01-01"));
    let mut slice = crate::types::StreamSlice::new();
    slice.insert("region".to_string(), json!("eu"));

    let ctx = RequestContext::new(state.clone(), Some(slice.clone()));
    assert_eq!(ctx.stream_state, state);
    assert_eq!(ctx.stream_slice, Some(slice));
    assert_eq!(ctx.next_page_token, None);

    let mut token = PageToken::new();
    token.insert("page".to_string(), json!(2));
    let next = ctx.with_token(Some(token.clone()));
    // State and slice pass through unmodified
    assert_eq!(next.stream_state, ctx.stream_state);
    assert_eq!(next.stream_slice, ctx.stream_slice);
    assert_eq!(next.next_page_token, Some(token));
}

#[tokio::test]
async fn test_substream_slices_wrap_parent_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"records": [{"id": 1}, {"id": 2}]})),
        )
        .mount(&server)
        .await;

    let parent = StreamReader::new(ItemsStream::new(server.uri()), HttpClient::new());
    let slicer = SubstreamSlicer::new(parent);
    let slices = slicer.stream_slices().await.unwrap();

    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].get(PARENT_KEY), Some(&json!({"id": 1})));
    assert_eq!(slices[1].get(PARENT_KEY), Some(&json!({"id": 2})));
}
