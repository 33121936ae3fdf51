//! Authentication module
//!
//! Supports: static token, Basic, API key, round-robin token pools, and
//! OAuth2 (client-credentials and refresh-token grants with token caching).
//!
//! All authenticators implement [`Authenticator`], a header-producing hook
//! the HTTP client invokes once per attempt.

mod authenticator;
mod oauth;
mod types;

pub use authenticator::{
    ApiKeyAuthenticator, Authenticator, BasicHttpAuthenticator, MultipleTokenAuthenticator,
    NoAuth, TokenAuthenticator,
};
pub use oauth::OAuth2Authenticator;
pub use types::{CachedToken, OAuth2Config, TokenGrant};
