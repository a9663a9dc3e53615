//! Retry with exponential back-off and jitter for backend calls.
//!
//! Only transient failures are retried. A malformed response is returned
//! immediately: asking again for the same prompt rarely fixes the shape and
//! the caller already has a fallback.

use std::future::Future;
use std::time::Duration;

use crate::error::BackendError;

const MAX_DELAY_MS: u64 = 10_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** timeouts, connection failures, HTTP 429 and 5xx.
///
/// **Not retriable:** other 4xx statuses (bad key, bad request), invalid
/// base URLs and malformed responses.
pub(crate) fn is_retriable(err: &BackendError) -> bool {
    match err {
        BackendError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        BackendError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        BackendError::InvalidBaseUrl { .. } | BackendError::MalformedResponse { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The n-th retry sleeps `backoff_base_ms × 2^(n-1)` ± 25 % jitter, capped at 10 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "generative backend transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
