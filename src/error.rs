//! Error types for Wirepull
//!
//! This module defines the error taxonomy for the crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Transient failures (429, 5xx, connect/timeout transport errors) are
//! retried inside the HTTP client and only surface here once the retry
//! budget is exhausted; persistent client errors and configuration errors
//! propagate immediately.

use thiserror::Error;

/// The main error type for Wirepull
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus {
        status: u16,
        message: String,
        body: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("only one of a JSON body and a form body may be set on a request")]
    RequestBody,

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a token refresh error
    pub fn token_refresh(message: impl Into<String>) -> Self {
        Self::TokenRefresh {
            message: message.into(),
        }
    }

    /// Create an HTTP status error; the message defaults to the body text
    pub fn http_status(status: u16, message: Option<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::HttpStatus {
            status,
            message: message.unwrap_or_else(|| body.clone()),
            body,
        }
    }

    /// The HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error came from a transient condition.
    ///
    /// A `true` here means the request was already retried up to the
    /// configured bound before surfacing.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            Error::Http(e) => is_transient_transport_error(e),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable (429 or any 5xx)
pub(crate) fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Transport errors that never produced an HTTP status are transient:
/// timeouts, connect failures, server disconnects and connection resets
/// mid-request, and bodies cut off mid-read. Builder and redirect-policy
/// errors propagate immediately.
pub(crate) fn is_transient_transport_error(err: &reqwest::Error) -> bool {
    if err.is_builder() || err.is_redirect() || err.status().is_some() {
        return false;
    }
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_decode()
}

/// Result type alias for Wirepull
pub type Result<T> = std::result::Result<T, Error>;
