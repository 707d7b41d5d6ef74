//! Bounded retry for transient failures of external calls.
//!
//! Every error is treated as retryable. Attempts are separated by a fixed backoff;
//! an optional [`CancellationToken`] cuts the backoff short and returns the last error.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(5000);

/// Describes an external call and whether repeating it is safe.
///
/// Non-idempotent calls (creates that would fail or duplicate on a second attempt)
/// run exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalCall {
    pub name: &'static str,
    pub idempotent: bool,
}

impl ExternalCall {
    pub const fn idempotent(name: &'static str) -> Self {
        Self {
            name,
            idempotent: true,
        }
    }

    pub const fn once(name: &'static str) -> Self {
        Self {
            name,
            idempotent: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryHandler {
    max_attempts: u32,
    backoff: Duration,
    cancel: Option<CancellationToken>,
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF)
    }
}

impl RetryHandler {
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Runs `f` until it succeeds or the attempts are exhausted; returns the last error.
    pub async fn retry<T, E, F, Fut>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    warn!(attempts = attempt, error = %e, "external call failed, giving up");
                    return Err(e);
                }
                Err(e) => {
                    debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "external call failed, retrying"
                    );
                    if !self.wait().await {
                        warn!(attempts = attempt, "retry cancelled");
                        return Err(e);
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Same loop as [`retry`](Self::retry) but yields `None` on exhaustion.
    pub async fn retry_ignore_error<T, E, F, Fut>(&self, f: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.retry(f).await.ok()
    }

    /// Applies the retry policy declared by `call`.
    pub async fn execute<T, E, F, Fut>(&self, call: ExternalCall, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        if call.idempotent {
            debug!(call = call.name, "calling with retry");
            self.retry(f).await
        } else {
            debug!(call = call.name, "calling once");
            f().await
        }
    }

    async fn wait(&self) -> bool {
        match &self.cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => false,
                _ = tokio::time::sleep(self.backoff) => true,
            },
            None => {
                tokio::time::sleep(self.backoff).await;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast() -> RetryHandler {
        RetryHandler::new(DEFAULT_MAX_ATTEMPTS, Duration::ZERO)
    }

    fn failing_until(
        calls: Arc<AtomicUsize>,
        failures: usize,
    ) -> impl FnMut() -> std::future::Ready<Result<&'static str, String>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < failures {
                std::future::ready(Err(format!("failure {}", n)))
            } else {
                std::future::ready(Ok("done"))
            }
        }
    }

    #[test]
    fn test_default_policy() {
        let handler = RetryHandler::default();
        assert_eq!(handler.max_attempts(), 10);
        assert_eq!(handler.backoff(), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_succeeds_after_k_failures() {
        for k in [0usize, 1, 4, 9] {
            let calls = Arc::new(AtomicUsize::new(0));
            let result = fast().retry(failing_until(calls.clone(), k)).await;
            assert_eq!(result, Ok("done"));
            assert_eq!(calls.load(Ordering::SeqCst), k + 1);
        }
    }

    #[tokio::test]
    async fn test_always_failing_returns_last_error_after_ten_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result = fast().retry(failing_until(calls.clone(), usize::MAX)).await;
        assert_eq!(result, Err("failure 9".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_ignore_error_returns_none() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result = fast()
            .retry_ignore_error(failing_until(calls.clone(), usize::MAX))
            .await;
        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_non_idempotent_call_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result = fast()
            .execute(
                ExternalCall::once("createBotChannelRegistration"),
                failing_until(calls.clone(), usize::MAX),
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let calls = Arc::new(AtomicUsize::new(0));
        let result = fast()
            .execute(
                ExternalCall::idempotent("createOrUpdateWebApp"),
                failing_until(calls.clone(), 2),
            )
            .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancellation_stops_backoff() {
        let token = CancellationToken::new();
        token.cancel();
        let handler =
            RetryHandler::new(DEFAULT_MAX_ATTEMPTS, Duration::from_secs(3600)).with_cancellation(token);
        let calls = Arc::new(AtomicUsize::new(0));

        let result = handler.retry(failing_until(calls.clone(), usize::MAX)).await;

        assert_eq!(result, Err("failure 0".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
