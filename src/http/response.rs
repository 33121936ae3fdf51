//! Owned response model and error-message extraction
//!
//! Responses are fully read into memory before classification so retry
//! hooks and record parsers can inspect status, headers, and body without
//! holding a live connection.

use crate::types::JsonValue;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use std::time::Duration;
use url::Url;

/// An owned HTTP response: status, headers, body bytes, and the final URL
/// after redirects.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
    url: Url,
}

impl HttpResponse {
    /// Create a response from its parts
    pub fn new(status: u16, headers: HeaderMap, body: Bytes, url: Url) -> Self {
        Self {
            status,
            headers,
            body,
            url,
        }
    }

    /// Read the body of a live `reqwest` response, consuming it
    pub async fn from_reqwest(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?;
        Ok(Self::new(status, headers, body, url))
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Final request URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Body decoded as UTF-8 text (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON, if it is JSON
    pub fn json(&self) -> Option<JsonValue> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the status is a 4xx client error
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Whether the status is a 5xx server error
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Parse a numeric `Retry-After` header into a duration
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

/// Extract a human-readable error message from the common API error body
/// shapes: `message`, `messages`, `error`, `errors`, `failures`, `failure`,
/// plain strings, and lists of either. List entries are joined with `", "`.
/// Returns `None` when the body is not JSON or matches none of the shapes.
pub fn default_error_message(response: &HttpResponse) -> Option<String> {
    let body = response.json()?;
    walk_error_value(&body)
}

const ERROR_KEYS: [&str; 6] = ["message", "messages", "error", "errors", "failures", "failure"];

fn walk_error_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Array(items) => {
            let messages: Vec<String> = items.iter().filter_map(walk_error_value).collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join(", "))
            }
        }
        JsonValue::Object(map) => ERROR_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|v| is_truthy(v))
            .and_then(|v| walk_error_value(v)),
        _ => None,
    }
}

// Mirrors the truthiness rules used when picking among candidate error keys:
// empty strings, empty collections, zero, false, and null are all skipped.
fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64() != Some(0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
    }
}
