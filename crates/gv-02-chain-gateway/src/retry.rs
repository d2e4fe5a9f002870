//! # Retry
//!
//! Bounded retry with linear backoff for outbound chain calls.
//!
//! - HTTP calls retry on any non-200 status or transport failure.
//! - Query calls retry only on transient status codes; any other failure is
//!   returned after the first attempt.
//!
//! Attempt `n` (1-based) that fails is followed by a pause of
//! `n * (base + jitter)` before the next one. The caller is blocked until
//! success or exhaustion.

use crate::domain::{GatewayError, QueryCode};
use gv_01_channel_flow::ChainId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry budget shared by every outbound call of a chain adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed part of the backoff step, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound of the random part of the backoff step, in milliseconds.
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            jitter_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    /// Policy with no pauses between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay_ms: 0,
            jitter_ms: 0,
        }
    }

    /// Attempts actually made; never fewer than one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Pause after failed attempt `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        };
        Duration::from_millis(u64::from(attempt) * (self.base_delay_ms + jitter))
    }
}

/// Failure of a single HTTP attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HttpFailure {
    /// Non-200 status.
    Status(u16),
    /// Connection, timeout or body failure.
    Transport(String),
    /// JSON-RPC error object or unreadable body.
    Body(String),
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "HTTP status {status}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Body(e) => write!(f, "body: {e}"),
        }
    }
}

/// Failure of a single query attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryFailure {
    /// Status class.
    pub code: QueryCode,
    /// Endpoint message.
    pub message: String,
}

impl QueryFailure {
    /// Create a query failure.
    pub fn new(code: QueryCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Run an HTTP call under `policy`.
pub async fn retry_http<T, F, Fut>(
    policy: &RetryPolicy,
    chain: &ChainId,
    mut call: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HttpFailure>>,
{
    let attempts = policy.attempts();
    let mut last = String::new();
    for attempt in 1..=attempts {
        match call().await {
            Ok(value) => return Ok(value),
            Err(failure) => {
                warn!(
                    "[gv-02] chain {} attempt {}/{} failed: {}",
                    chain, attempt, attempts, failure
                );
                last = failure.to_string();
            }
        }
        if attempt < attempts {
            let pause = policy.delay_for(attempt);
            debug!("[gv-02] chain {} retrying in {:?}", chain, pause);
            tokio::time::sleep(pause).await;
        }
    }
    Err(GatewayError::Unachievable {
        chain: chain.clone(),
        attempts,
        reason: last,
    })
}

/// Run a query call under `policy`; `what` names the queried object.
pub async fn retry_query<T, F, Fut>(
    policy: &RetryPolicy,
    chain: &ChainId,
    what: &str,
    mut call: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, QueryFailure>>,
{
    let attempts = policy.attempts();
    let mut last = String::new();
    for attempt in 1..=attempts {
        match call().await {
            Ok(value) => return Ok(value),
            Err(failure) if failure.code.is_transient() => {
                warn!(
                    "[gv-02] chain {} query {} attempt {}/{} failed: {} {}",
                    chain, what, attempt, attempts, failure.code, failure.message
                );
                last = format!("{}: {}", failure.code, failure.message);
            }
            Err(failure) if failure.code == QueryCode::NotFound => {
                return Err(GatewayError::NotFound(what.to_string()));
            }
            Err(failure) => {
                return Err(GatewayError::Rejected {
                    code: failure.code,
                    message: failure.message,
                });
            }
        }
        if attempt < attempts {
            tokio::time::sleep(policy.delay_for(attempt)).await;
        }
    }
    Err(GatewayError::Unachievable {
        chain: chain.clone(),
        attempts,
        reason: last,
    })
}
