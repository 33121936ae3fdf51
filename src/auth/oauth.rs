//! OAuth2 authenticator with cached token refresh

use super::authenticator::Authenticator;
use super::types::{CachedToken, OAuth2Config, TokenGrant};
use crate::error::{Error, Result};
use crate::types::StringMap;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// OAuth2 access-token authenticator.
///
/// Obtains a token via the client-credentials or refresh-token grant,
/// caches it with its expiry, and refreshes under a double-checked write
/// lock so concurrent attempts trigger at most one token request.
pub struct OAuth2Authenticator {
    config: OAuth2Config,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    http_client: Client,
}

impl OAuth2Authenticator {
    /// Create a new authenticator with its own token-request client
    pub fn new(config: OAuth2Config) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create an authenticator reusing an existing HTTP client
    pub fn with_client(config: OAuth2Config, http_client: Client) -> Self {
        Self {
            config,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Get a valid token, refreshing if necessary
    async fn get_or_refresh_token(&self) -> Result<String> {
        // Fast path under the read lock
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Double-check after acquiring the write lock (another task might
        // have refreshed)
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.fetch_new_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    async fn fetch_new_token(&self) -> Result<CachedToken> {
        let mut form = vec![
            ("client_id", self.config.client_id.clone()),
            ("client_secret", self.config.client_secret.clone()),
        ];

        match &self.config.grant {
            TokenGrant::ClientCredentials { scopes } => {
                form.push(("grant_type", "client_credentials".to_string()));
                if !scopes.is_empty() {
                    form.push(("scope", scopes.join(" ")));
                }
            }
            TokenGrant::RefreshToken { refresh_token } => {
                form.push(("grant_type", "refresh_token".to_string()));
                form.push(("refresh_token", refresh_token.clone()));
            }
        }

        for (key, value) in &self.config.extra_body {
            form.push((key.as_str(), value.clone()));
        }

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::token_refresh(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        Ok(token_response.into_cached_token())
    }

    /// Drop the cached token, forcing a refresh on the next attempt
    pub async fn clear_cache(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    /// The grant configuration
    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }
}

#[async_trait]
impl Authenticator for OAuth2Authenticator {
    async fn auth_headers(&self) -> Result<StringMap> {
        let token = self.get_or_refresh_token().await?;
        let mut headers = StringMap::new();
        headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        Ok(headers)
    }
}

impl std::fmt::Debug for OAuth2Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Authenticator")
            .field("token_url", &self.config.token_url)
            .finish_non_exhaustive()
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}
