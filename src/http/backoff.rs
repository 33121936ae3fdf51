//! Retry/backoff policy and the combined retry state machine
//!
//! Two decision layers share one timer: a user-defined backoff (a stream
//! returning a positive duration, typically read from `Retry-After`) and a
//! default exponential backoff for transient failures with no supplied
//! duration. Both are bounded by the same `max_retries`/`max_time` budget,
//! so total-attempt accounting lives in a single place, [`RetryTimer`].

use super::response::{default_error_message, HttpResponse};
use crate::error::is_retryable_status;
use std::time::{Duration, Instant};

/// Default number of additional retry attempts after the initial try
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default ceiling on total time spent across all attempts
pub const DEFAULT_MAX_TIME: Duration = Duration::from_secs(600);

/// Default multiplier for the exponential backoff, in seconds
pub const DEFAULT_RETRY_FACTOR: f64 = 5.0;

/// Outcome of classifying a failed request
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffDecision {
    /// Retry, sleeping `after + 1s` when a duration is supplied, or the
    /// default exponential delay when not
    Retry { after: Option<Duration> },
    /// Do not retry; `propagate` raises the error, otherwise the raw
    /// response is handed back for caller inspection
    Fail { propagate: bool },
}

/// Per-request retry hooks with the default transient/persistent split.
///
/// Implemented by every stream; the HTTP client consults these on each
/// attempt and never applies connector-specific logic of its own.
pub trait BackoffPolicy: Send + Sync {
    /// Number of retries after the initial attempt; `None` retries without
    /// bound (subject to `max_time`)
    fn max_retries(&self) -> Option<u32> {
        Some(DEFAULT_MAX_RETRIES)
    }

    /// Ceiling on total elapsed time across attempts; `None` removes the
    /// ceiling
    fn max_time(&self) -> Option<Duration> {
        Some(DEFAULT_MAX_TIME)
    }

    /// Multiplier for the default exponential backoff, in seconds
    fn retry_factor(&self) -> f64 {
        DEFAULT_RETRY_FACTOR
    }

    /// Whether non-retryable error statuses raise or return the raw
    /// response to the caller
    fn raise_on_http_errors(&self) -> bool {
        true
    }

    /// Whether this response should be retried. Consulted before the
    /// status-class rules, so a stream may retry e.g. a 200 carrying an
    /// error payload. The default retries 429 and all 5xx.
    fn should_retry(&self, response: &HttpResponse) -> bool {
        is_retryable_status(response.status())
    }

    /// Stream-supplied backoff duration, e.g. parsed from `Retry-After`.
    /// `None` selects the default exponential backoff.
    fn backoff_time(&self, response: &HttpResponse) -> Option<Duration> {
        let _ = response;
        None
    }

    /// Message surfaced with a terminal error for this response
    fn error_message(&self, response: &HttpResponse) -> Option<String> {
        default_error_message(response)
    }
}

/// What the retry timer decided about the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryVerdict {
    /// Sleep this long, then retry
    Sleep(Duration),
    /// Budget exhausted; surface the last outcome
    GiveUp,
}

/// Combined retry state machine for one logical request.
///
/// `max_retries` is interpreted as "additional retry attempts", so a value
/// of N allows N + 1 total tries including the initial one. Elapsed-time
/// accounting abandons a retry when the proposed sleep would reach
/// `max_time`.
#[derive(Debug)]
pub struct RetryTimer {
    max_tries: Option<u32>,
    max_time: Option<Duration>,
    retry_factor: f64,
    started: Instant,
    completed_tries: u32,
}

impl RetryTimer {
    /// Create a timer from a policy's bounds
    pub fn from_policy<P: BackoffPolicy + ?Sized>(policy: &P) -> Self {
        Self::new(policy.max_retries(), policy.max_time(), policy.retry_factor())
    }

    /// Create a timer; `max_retries` counts retries beyond the first try
    pub fn new(max_retries: Option<u32>, max_time: Option<Duration>, retry_factor: f64) -> Self {
        Self {
            max_tries: max_retries.map(|retries| retries.saturating_add(1)),
            max_time,
            retry_factor,
            started: Instant::now(),
            completed_tries: 0,
        }
    }

    /// Record a failed attempt and decide whether to retry.
    ///
    /// `user_backoff` is the stream-supplied duration; when present the
    /// sleep is `user_backoff + 1s`, otherwise `retry_factor * 2^n` seconds
    /// where n counts completed retries.
    pub fn next_attempt(&mut self, user_backoff: Option<Duration>) -> RetryVerdict {
        self.completed_tries += 1;
        if let Some(max_tries) = self.max_tries {
            if self.completed_tries >= max_tries {
                return RetryVerdict::GiveUp;
            }
        }

        let delay = match user_backoff {
            Some(backoff) => backoff + Duration::from_secs(1),
            None => {
                let exponent = (self.completed_tries - 1).min(31);
                Duration::from_secs_f64(self.retry_factor * f64::from(1u32 << exponent))
            }
        };

        if let Some(max_time) = self.max_time {
            if self.started.elapsed() + delay >= max_time {
                return RetryVerdict::GiveUp;
            }
        }

        RetryVerdict::Sleep(delay)
    }

    /// Attempts completed so far
    pub fn completed_tries(&self) -> u32 {
        self.completed_tries
    }

    /// Time elapsed since the first attempt
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
