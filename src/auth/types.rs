//! Auth support types

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// OAuth2 grant used to obtain an access token
#[derive(Debug, Clone)]
pub enum TokenGrant {
    /// `client_credentials` grant
    ClientCredentials {
        /// Requested scopes, joined with spaces
        scopes: Vec<String>,
    },
    /// `refresh_token` grant
    RefreshToken {
        /// The long-lived refresh token
        refresh_token: String,
    },
}

/// Configuration for [`super::OAuth2Authenticator`]
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    /// Token endpoint URL
    pub token_url: String,
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Grant flow
    pub grant: TokenGrant,
    /// Additional token request body parameters
    pub extra_body: HashMap<String, String>,
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false, // No expiration = never expires
        }
    }
}
