//! HTTP layer: request/response model, retry core, cache, and call-rate
//! budget
//!
//! # Features
//!
//! - **Combined retry state machine**: user-defined and exponential backoff
//!   share one `max_retries`/`max_time` budget
//! - **Error classification**: 429/5xx/transport-transient retried, other
//!   4xx surfaced immediately
//! - **Call-rate budget**: token bucket acquired before every attempt
//! - **Request cache**: caller-owned, keyed by request signature

mod backoff;
mod cache;
mod client;
mod rate_limit;
mod request;
mod response;

pub use backoff::{
    BackoffDecision, BackoffPolicy, RetryTimer, RetryVerdict, DEFAULT_MAX_RETRIES,
    DEFAULT_MAX_TIME, DEFAULT_RETRY_FACTOR,
};
pub use cache::RequestCache;
pub use client::{HttpClient, HttpClientConfig, MAX_CONNECTION_POOL_SIZE};
pub use rate_limit::{ApiBudget, ApiBudgetConfig};
pub use request::{join_url, HttpRequest, HttpRequestBuilder, RequestBody};
pub use response::{default_error_message, HttpResponse};
