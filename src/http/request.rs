//! Request model and URL construction
//!
//! A request is built per page from stream-supplied hooks: path, query
//! params, headers, and at most one of a JSON or form body. All query
//! handling (joining onto params already encoded in the path, optional
//! deduplication) happens here so the client and the retry loop only ever
//! see a fully resolved URL.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Method, StringMap};
use url::Url;

/// Request body: JSON or form-encoded, never both
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON body, sent with `Content-Type: application/json`
    Json(JsonValue),
    /// URL-encoded form body
    Form(StringMap),
}

/// A fully resolved HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: StringMap,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    /// Start building a request for `method` against `base`/`path`
    pub fn builder(
        method: Method,
        base: impl Into<String>,
        path: impl Into<String>,
    ) -> HttpRequestBuilder {
        HttpRequestBuilder {
            method,
            base: base.into(),
            path: path.into(),
            params: Vec::new(),
            headers: StringMap::new(),
            body_json: None,
            body_form: None,
            deduplicate_query_params: false,
        }
    }

    /// Stable signature identifying this request for caching purposes:
    /// method, resolved URL with canonicalized query order, and body.
    pub fn signature(&self) -> String {
        let mut query: Vec<(String, String)> = self
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        query.sort();
        let query: Vec<String> = query.into_iter().map(|(k, v)| format!("{k}={v}")).collect();

        let mut url = self.url.clone();
        url.set_query(None);

        let body = match &self.body {
            Some(RequestBody::Json(value)) => value.to_string(),
            Some(RequestBody::Form(form)) => {
                let mut pairs: Vec<String> =
                    form.iter().map(|(k, v)| format!("{k}={v}")).collect();
                pairs.sort();
                pairs.join("&")
            }
            None => String::new(),
        };
        format!("{} {}?{} {}", self.method, url, query.join("&"), body)
    }
}

/// Builder for [`HttpRequest`]
#[derive(Debug)]
pub struct HttpRequestBuilder {
    method: Method,
    base: String,
    path: String,
    params: Vec<(String, String)>,
    headers: StringMap,
    body_json: Option<JsonValue>,
    body_form: Option<StringMap>,
    deduplicate_query_params: bool,
}

impl HttpRequestBuilder {
    /// Add query parameters
    #[must_use]
    pub fn params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    /// Add a single query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Merge headers; later entries win on key conflict
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set a JSON body
    #[must_use]
    pub fn body_json(mut self, body: Option<JsonValue>) -> Self {
        self.body_json = body;
        self
    }

    /// Set a form-encoded body
    #[must_use]
    pub fn body_form(mut self, body: Option<StringMap>) -> Self {
        self.body_form = body;
        self
    }

    /// Skip query params that are already encoded in the path with the
    /// same value
    #[must_use]
    pub fn deduplicate_query_params(mut self, dedupe: bool) -> Self {
        self.deduplicate_query_params = dedupe;
        self
    }

    /// Resolve the final URL and validate the body configuration
    pub fn build(self) -> Result<HttpRequest> {
        let mut url = Url::parse(&join_url(&self.base, &self.path))?;

        let existing: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &self.params {
                if self.deduplicate_query_params
                    && existing.iter().any(|(k, v)| k == key && v == value)
                {
                    continue;
                }
                query.append_pair(key, value);
            }
        }
        // query_pairs_mut leaves a dangling "?" when nothing was appended
        if url.query() == Some("") {
            url.set_query(None);
        }

        let body = match (self.body_json, self.body_form) {
            (Some(_), Some(_)) => return Err(Error::RequestBody),
            (Some(json), None) => Some(RequestBody::Json(json)),
            (None, Some(form)) => Some(RequestBody::Form(form)),
            (None, None) => None,
        };

        // Bodies are stripped for methods that don't carry one
        let body = if self.method.supports_request_body() {
            body
        } else {
            None
        };

        Ok(HttpRequest {
            method: self.method,
            url,
            headers: self.headers,
            body,
        })
    }
}

/// Join a base URL and a path with exactly one slash between them.
///
/// A trailing slash on the path is preserved; an empty path leaves the
/// base untouched.
pub fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
