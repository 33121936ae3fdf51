//! Stream abstraction: the `HttpStream` hook trait, the pagination
//! reader, and substream slicing
//!
//! A stream describes one paginated API resource. The hooks are pure
//! functions of the request context (state, slice, page token); the
//! [`StreamReader`] owns the loop that strings them together.

mod reader;
mod substream;

use crate::http::{BackoffPolicy, HttpResponse};
use crate::types::{JsonValue, Method, PageToken, StreamSlice, StreamState, StringMap};
use async_trait::async_trait;

pub use reader::StreamReader;
pub use substream::{SubstreamSlicer, PARENT_KEY};

/// The inputs every request-building hook is a pure function of
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Cursor checkpoint owned by the caller
    pub stream_state: StreamState,
    /// Partition under which the stream is being read
    pub stream_slice: Option<StreamSlice>,
    /// Token for the page being fetched; `None` on the first page
    pub next_page_token: Option<PageToken>,
}

impl RequestContext {
    /// Context for the first page of a sync
    pub fn new(stream_state: StreamState, stream_slice: Option<StreamSlice>) -> Self {
        Self {
            stream_state,
            stream_slice,
            next_page_token: None,
        }
    }

    /// The same state and slice with a different page token
    pub fn with_token(&self, next_page_token: Option<PageToken>) -> Self {
        Self {
            stream_state: self.stream_state.clone(),
            stream_slice: self.stream_slice.clone(),
            next_page_token,
        }
    }
}

/// One paginated API resource.
///
/// Implementors supply request construction and response parsing; retry
/// behavior comes from the [`BackoffPolicy`] supertrait, which this trait
/// inherits with its transient/persistent defaults.
#[async_trait]
pub trait HttpStream: BackoffPolicy {
    /// Stream name, used in logs
    fn name(&self) -> &str;

    /// URL base shared by every page of this stream
    fn url_base(&self) -> String;

    /// Path below the URL base; may carry its own query string
    fn path(&self, ctx: &RequestContext) -> String;

    /// HTTP method for every page
    fn http_method(&self) -> Method {
        Method::GET
    }

    /// Skip query params already encoded in the path with the same value
    fn must_deduplicate_query_params(&self) -> bool {
        false
    }

    /// Query parameters for one page
    fn request_params(&self, ctx: &RequestContext) -> StringMap {
        let _ = ctx;
        StringMap::new()
    }

    /// Headers for one page, merged under the authenticator's
    fn request_headers(&self, ctx: &RequestContext) -> StringMap {
        let _ = ctx;
        StringMap::new()
    }

    /// JSON body for one page. At most one of the JSON and form bodies
    /// may return a value.
    fn request_body_json(&self, ctx: &RequestContext) -> Option<JsonValue> {
        let _ = ctx;
        None
    }

    /// Form-encoded body for one page
    fn request_body_form(&self, ctx: &RequestContext) -> Option<StringMap> {
        let _ = ctx;
        None
    }

    /// Extract the token for the page after this response. `None` (or an
    /// empty token) ends pagination.
    async fn next_page_token(&self, response: &HttpResponse) -> crate::Result<Option<PageToken>>;

    /// Parse one page into zero or more records
    async fn parse_response(
        &self,
        response: &HttpResponse,
        ctx: &RequestContext,
    ) -> crate::Result<Vec<JsonValue>>;
}

#[cfg(test)]
mod tests;
