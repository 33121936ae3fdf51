//! Common types used throughout Wirepull
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

/// Opaque cursor extracted from a response and used to fetch the next page.
/// `None` in the pagination loop means the stream is exhausted.
pub type PageToken = JsonObject;

/// A partition parameter under which a stream is read (e.g. a date range or
/// a parent-record id). Owned by the calling stream and passed through
/// unmodified by the retry core.
pub type StreamSlice = JsonObject;

/// The cursor checkpoint of a stream. Owned and mutated by the caller, never
/// by the reader.
pub type StreamState = JsonObject;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
    OPTIONS,
}

impl Method {
    /// Whether a request body may be attached for this method.
    /// Bodies are sent for GET/POST/PUT/PATCH only.
    pub fn supports_request_body(self) -> bool {
        matches!(
            self,
            Method::GET | Method::POST | Method::PUT | Method::PATCH
        )
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
            Method::DELETE => reqwest::Method::DELETE,
            Method::OPTIONS => reqwest::Method::OPTIONS,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_conversion() {
        let get: reqwest::Method = Method::GET.into();
        assert_eq!(reqwest::Method::GET, get);
        let post: reqwest::Method = Method::POST.into();
        assert_eq!(reqwest::Method::POST, post);
    }

    #[test]
    fn test_method_default() {
        assert_eq!(Method::default(), Method::GET);
    }

    #[test]
    fn test_method_body_support() {
        assert!(Method::GET.supports_request_body());
        assert!(Method::POST.supports_request_body());
        assert!(Method::PUT.supports_request_body());
        assert!(Method::PATCH.supports_request_body());
        assert!(!Method::DELETE.supports_request_body());
        assert!(!Method::OPTIONS.supports_request_body());
    }

    #[test]
    fn test_method_serde() {
        let m: Method = serde_json::from_str("\"POST\"").unwrap();
        assert_eq!(m, Method::POST);

        let json = serde_json::to_string(&Method::DELETE).unwrap();
        assert_eq!(json, "\"DELETE\"");
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::GET.to_string(), "GET");
        assert_eq!(Method::OPTIONS.to_string(), "OPTIONS");
    }
}
