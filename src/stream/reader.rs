//! Pagination reader
//!
//! Drives the two-state pagination loop: fetch a page with the current
//! token, hand the response to the stream's parser, extract the next
//! token, stop when it is absent. Transient failures inside a page fetch
//! are absorbed entirely by the client's retry machinery and never advance
//! pagination state.

use super::{HttpStream, RequestContext};
use crate::http::{HttpClient, HttpRequest};
use crate::types::{JsonValue, PageToken, StreamSlice, StreamState};
use futures::stream::{Stream, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

/// Pagination loop state
#[derive(Debug, Clone)]
enum Pagination {
    Fetching(Option<PageToken>),
    Done,
}

/// Reads a stream page by page through an [`HttpClient`]
pub struct StreamReader<S: HttpStream> {
    stream: Arc<S>,
    client: Arc<HttpClient>,
}

impl<S: HttpStream> Clone for StreamReader<S> {
    fn clone(&self) -> Self {
        Self {
            stream: Arc::clone(&self.stream),
            client: Arc::clone(&self.client),
        }
    }
}

impl<S: HttpStream> StreamReader<S> {
    /// Create a reader for `stream` over `client`
    pub fn new(stream: S, client: HttpClient) -> Self {
        Self {
            stream: Arc::new(stream),
            client: Arc::new(client),
        }
    }

    /// The wrapped stream
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// The underlying client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Build the request for one page from the stream's hooks
    pub fn build_request(&self, ctx: &RequestContext) -> crate::Result<HttpRequest> {
        HttpRequest::builder(
            self.stream.http_method(),
            self.stream.url_base(),
            self.stream.path(ctx),
        )
        .params(self.stream.request_params(ctx))
        .headers(self.stream.request_headers(ctx))
        .body_json(self.stream.request_body_json(ctx))
        .body_form(self.stream.request_body_form(ctx))
        .deduplicate_query_params(self.stream.must_deduplicate_query_params())
        .build()
    }

    /// Fetch and parse a single page, returning its records and the token
    /// for the page after it
    pub async fn read_page(
        &self,
        ctx: &RequestContext,
    ) -> crate::Result<(Vec<JsonValue>, Option<PageToken>)> {
        let request = self.build_request(ctx)?;
        let response = self.client.send(&request, self.stream.as_ref()).await?;
        let records = self.stream.parse_response(&response, ctx).await?;
        // An empty token means the same thing as no token: done
        let token = self
            .stream
            .next_page_token(&response)
            .await?
            .filter(|token| !token.is_empty());
        debug!(
            "Stream '{}': page yielded {} records, next token {}",
            self.stream.name(),
            records.len(),
            if token.is_some() { "present" } else { "absent" }
        );
        Ok((records, token))
    }

    /// Lazily read every record of one slice. Pages are fetched on demand
    /// as the returned stream is polled; no page is fetched twice.
    pub fn read_records(
        &self,
        stream_slice: Option<StreamSlice>,
        stream_state: StreamState,
    ) -> impl Stream<Item = crate::Result<JsonValue>> {
        let reader = self.clone();
        let base_ctx = RequestContext::new(stream_state, stream_slice);

        futures::stream::try_unfold(Pagination::Fetching(None), move |pagination| {
            let reader = reader.clone();
            let base_ctx = base_ctx.clone();
            async move {
                match pagination {
                    Pagination::Done => Ok::<_, crate::Error>(None),
                    Pagination::Fetching(token) => {
                        let ctx = base_ctx.with_token(token);
                        let (records, next_token) = reader.read_page(&ctx).await?;
                        let next = match next_token {
                            Some(token) => Pagination::Fetching(Some(token)),
                            None => Pagination::Done,
                        };
                        Ok(Some((records, next)))
                    }
                }
            }
        })
        .map_ok(|records| futures::stream::iter(records.into_iter().map(crate::Result::Ok)))
        .try_flatten()
    }

    /// Read every record of one slice into memory
    pub async fn read_all(
        &self,
        stream_slice: Option<StreamSlice>,
        stream_state: StreamState,
    ) -> crate::Result<Vec<JsonValue>> {
        self.read_records(stream_slice, stream_state)
            .try_collect()
            .await
    }
}

impl<S: HttpStream> std::fmt::Debug for StreamReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader")
            .field("stream", &self.stream.name())
            .finish_non_exhaustive()
    }
}
