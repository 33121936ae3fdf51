// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Wirepull
//!
//! The reusable core of an HTTP connector development kit: an asynchronous
//! paginated stream abstraction with backoff-driven retry and rate-limit
//! handling.
//!
//! A connector author implements the [`stream::HttpStream`] trait (path,
//! params, headers, body, page-token extraction, record parsing) and hands it
//! to a [`stream::StreamReader`]; the reader drives the pagination loop while
//! the [`http::HttpClient`] underneath handles authentication, request
//! caching, call-rate budgeting, and the two-tier retry policy (user-defined
//! `Retry-After`-style backoff vs. default exponential backoff).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wirepull::http::HttpClient;
//! use wirepull::stream::StreamReader;
//! use wirepull::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let reader = StreamReader::new(MyStream::default(), HttpClient::new());
//!     let records = reader.read_all(None, serde_json::Map::new()).await?;
//!     println!("pulled {} records", records.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       StreamReader                          │
//! │  read_records() → Stream<Record>                            │
//! │  read_page() → (records, next_page_token)                   │
//! └────────────────────────────┬────────────────────────────────┘
//!                              │
//! ┌──────────┬─────────────────┴───────────┬────────────────────┐
//! │   Auth   │           HTTP              │      Stream        │
//! ├──────────┼─────────────────────────────┼────────────────────┤
//! │ Token    │ Retry state machine         │ HttpStream hooks   │
//! │ Basic    │ Api budget (token bucket)   │ Pagination loop    │
//! │ ApiKey   │ Request cache               │ Substream slicing  │
//! │ OAuth2   │ Error classification        │                    │
//! └──────────┴─────────────────────────────┴────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: finish docs before 1.0 release

// ============================================================================
// Module declarations
// ============================================================================

/// Error taxonomy
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authenticator trait and implementations
pub mod auth;

/// HTTP request/response model, retry core, cache, and call-rate budget
pub mod http;

/// HttpStream trait, pagination reader, and substream slicing
pub mod stream;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::{JsonObject, JsonValue, Method, PageToken, StreamSlice, StreamState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
