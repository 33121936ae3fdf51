//! In-memory request cache
//!
//! Keyed by request signature (method + resolved URL + body). Only 2xx
//! responses are stored; a hit bypasses both the network and the retry
//! loop. The cache is constructed by the caller and handed to the client,
//! and cloning shares the underlying store so a parent stream and its
//! substreams can reuse each other's pages.

use super::request::HttpRequest;
use super::response::HttpResponse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared in-memory response cache
#[derive(Clone, Default)]
pub struct RequestCache {
    store: Arc<Mutex<HashMap<String, HttpResponse>>>,
}

impl RequestCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached response for this request
    pub fn get(&self, request: &HttpRequest) -> Option<HttpResponse> {
        let store = self.store.lock().expect("cache lock poisoned");
        store.get(&request.signature()).cloned()
    }

    /// Store a response. Non-2xx responses are ignored.
    pub fn store(&self, request: &HttpRequest, response: &HttpResponse) {
        if !response.is_success() {
            return;
        }
        let mut store = self.store.lock().expect("cache lock poisoned");
        store.insert(request.signature(), response.clone());
    }

    /// Drop all cached responses
    pub fn clear(&self) {
        let mut store = self.store.lock().expect("cache lock poisoned");
        store.clear();
    }

    /// Number of cached responses
    pub fn len(&self) -> usize {
        let store = self.store.lock().expect("cache lock poisoned");
        store.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RequestCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCache")
            .field("entries", &self.len())
            .finish()
    }
}
