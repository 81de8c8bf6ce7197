// src/error_recovery.rs
//! Status-driven retry with linear backoff for API requests.
//!
//! Transport failures are never retried. A 429 or 503 response is retried
//! while the budget lasts, sleeping `attempt * backoff_unit` in between.
//! Whatever response is left at the end is classified: success passes
//! through, 401/403 become authentication errors, any other status at or
//! above 400 becomes an API error.

use crate::api::types::{ApiRequest, ApiResponse};
use crate::api::{AsyncTransport, Transport};
use crate::constants::{ERROR_BODY_PREVIEW_LENGTH, MAX_RETRIES, RETRY_BACKOFF_UNIT};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{LoaderError, StatusClass};
use serde_json::Value;
use std::time::Duration;

/// Retry budget and backoff unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            backoff_unit: RETRY_BACKOFF_UNIT,
        }
    }
}

/// What to do after receiving a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryStep {
    /// Sleep, then send again as attempt number `attempt`.
    Retry { attempt: u32, delay: Duration },
    /// Classify this response and stop.
    Finish,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_unit: Duration) -> Self {
        Self {
            max_retries,
            backoff_unit,
        }
    }

    /// Sleep before the given 1-based retry attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }

    fn next_step(&self, response: &ApiResponse, retries_used: u32) -> RetryStep {
        if response.class().is_retryable() && retries_used < self.max_retries {
            let attempt = retries_used + 1;
            RetryStep::Retry {
                attempt,
                delay: self.backoff(attempt),
            }
        } else {
            RetryStep::Finish
        }
    }

    fn announce(&self, response: &ApiResponse, attempt: u32, sink: &dyn DiagnosticSink) {
        sink.emit(Diagnostic::RetryScheduled {
            url: response.url.clone(),
            status: response.status,
            attempt,
            max_retries: self.max_retries,
        });
    }
}

/// Sends a request on a blocking transport, retrying rate-limited responses.
pub fn send_with_retries(
    transport: &dyn Transport,
    request: &ApiRequest,
    policy: &RetryPolicy,
    sink: &dyn DiagnosticSink,
) -> Result<ApiResponse, LoaderError> {
    let mut retries_used = 0;
    loop {
        log::debug!("{} {} (retry {})", request.method, request.url, retries_used);
        let response = transport.execute(request)?;
        match policy.next_step(&response, retries_used) {
            RetryStep::Retry { attempt, delay } => {
                policy.announce(&response, attempt, sink);
                retries_used = attempt;
                std::thread::sleep(delay);
            }
            RetryStep::Finish => return raise_for_status(response),
        }
    }
}

/// Sends a request on the pooled async transport, retrying rate-limited responses.
pub async fn send_with_retries_async(
    transport: &dyn AsyncTransport,
    request: &ApiRequest,
    policy: &RetryPolicy,
    sink: &dyn DiagnosticSink,
) -> Result<ApiResponse, LoaderError> {
    let mut retries_used = 0;
    loop {
        log::debug!("{} {} (retry {})", request.method, request.url, retries_used);
        let response = transport.execute(request).await?;
        match policy.next_step(&response, retries_used) {
            RetryStep::Retry { attempt, delay } => {
                policy.announce(&response, attempt, sink);
                retries_used = attempt;
                tokio::time::sleep(delay).await;
            }
            RetryStep::Finish => return raise_for_status(response),
        }
    }
}

/// Passes successful responses through and classifies failed ones.
pub fn raise_for_status(response: ApiResponse) -> Result<ApiResponse, LoaderError> {
    let class = response.class();
    if class == StatusClass::Success {
        return Ok(response);
    }

    let detail = error_detail(&response.body);

    if class.is_auth() {
        return Err(LoaderError::Authentication {
            detail: detail.unwrap_or_else(|| response.status.to_string()),
            url: response.url,
            status: response.status,
        });
    }

    Err(LoaderError::Api {
        detail: detail.unwrap_or_else(|| "no detail".to_string()),
        url: response.url,
        status: response.status,
    })
}

/// Picks a human-readable detail out of an error body.
///
/// Prefers the JSON `message`, then `error`; otherwise falls back to the
/// start of the raw body.
fn error_detail(body: &str) -> Option<String> {
    if let Ok(Value::Object(payload)) = serde_json::from_str::<Value>(body) {
        let field = ["message", "error"].iter().find_map(|key| {
            payload
                .get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        });
        if let Some(field) = field {
            return Some(field.to_string());
        }
    }

    let snippet: String = body.trim().chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
    (!snippet.is_empty()).then_some(snippet)
}
