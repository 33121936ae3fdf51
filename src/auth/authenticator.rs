//! Authenticator trait and header-based implementations
//!
//! An authenticator produces the headers to merge into a request. It is
//! invoked once per attempt, which keeps refreshed or rotated tokens
//! current across retries.

use crate::error::{Error, Result};
use crate::types::StringMap;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Produces the auth headers for one request attempt
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Headers to merge into the request; auth wins on key conflict
    async fn auth_headers(&self) -> Result<StringMap>;
}

/// No authentication
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    async fn auth_headers(&self) -> Result<StringMap> {
        Ok(StringMap::new())
    }
}

/// Static token in an `Authorization` header, e.g. `Bearer <token>`
#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    token: String,
    auth_method: String,
    auth_header: String,
}

impl TokenAuthenticator {
    /// Bearer token in the `Authorization` header
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            auth_method: "Bearer".to_string(),
            auth_header: "Authorization".to_string(),
        }
    }

    /// Override the auth method (the word before the token)
    #[must_use]
    pub fn auth_method(mut self, method: impl Into<String>) -> Self {
        self.auth_method = method.into();
        self
    }

    /// Override the header carrying the token
    #[must_use]
    pub fn auth_header(mut self, header: impl Into<String>) -> Self {
        self.auth_header = header.into();
        self
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn auth_headers(&self) -> Result<StringMap> {
        let mut headers = StringMap::new();
        headers.insert(
            self.auth_header.clone(),
            format!("{} {}", self.auth_method, self.token),
        );
        Ok(headers)
    }
}

/// HTTP Basic auth: base64 of `username:password`
#[derive(Debug, Clone)]
pub struct BasicHttpAuthenticator {
    encoded: String,
}

impl BasicHttpAuthenticator {
    /// Create from a username and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let credentials = format!("{}:{}", username.into(), password.into());
        Self {
            encoded: BASE64.encode(credentials),
        }
    }
}

#[async_trait]
impl Authenticator for BasicHttpAuthenticator {
    async fn auth_headers(&self) -> Result<StringMap> {
        let mut headers = StringMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Basic {}", self.encoded),
        );
        Ok(headers)
    }
}

/// Rotates through a pool of tokens round-robin, one per attempt.
/// Spreads load across several API keys sharing one quota.
#[derive(Debug)]
pub struct MultipleTokenAuthenticator {
    tokens: Vec<String>,
    auth_method: String,
    next: AtomicUsize,
}

impl MultipleTokenAuthenticator {
    /// Create from a non-empty token pool
    pub fn new(tokens: Vec<String>) -> Result<Self> {
        if tokens.is_empty() {
            return Err(Error::auth("token pool must not be empty"));
        }
        Ok(Self {
            tokens,
            auth_method: "Bearer".to_string(),
            next: AtomicUsize::new(0),
        })
    }

    /// Override the auth method
    #[must_use]
    pub fn auth_method(mut self, method: impl Into<String>) -> Self {
        self.auth_method = method.into();
        self
    }

    fn next_token(&self) -> &str {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.tokens.len();
        &self.tokens[index]
    }
}

#[async_trait]
impl Authenticator for MultipleTokenAuthenticator {
    async fn auth_headers(&self) -> Result<StringMap> {
        let mut headers = StringMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("{} {}", self.auth_method, self.next_token()),
        );
        Ok(headers)
    }
}

/// API key in a custom header, with an optional value prefix
#[derive(Debug, Clone)]
pub struct ApiKeyAuthenticator {
    header: String,
    prefix: Option<String>,
    key: String,
}

impl ApiKeyAuthenticator {
    /// Create from a header name and key value
    pub fn new(header: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            prefix: None,
            key: key.into(),
        }
    }

    /// Prefix prepended to the key value (e.g. `"Token "`)
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn auth_headers(&self) -> Result<StringMap> {
        let mut headers = StringMap::new();
        let value = format!("{}{}", self.prefix.as_deref().unwrap_or(""), self.key);
        headers.insert(self.header.clone(), value);
        Ok(headers)
    }
}
