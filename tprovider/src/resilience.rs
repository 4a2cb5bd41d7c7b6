//! Retry/backoff policy and gateway operation hooks.
//!
//! Retries happen inside a gateway implementation only; callers above the
//! gateway see a single success or a single final error.

use std::future::Future;
use std::time::Duration;

use crate::{GatewayId, ProviderError};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// A policy that performs exactly one attempt.
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    pub fn should_retry(&self, attempt: u32, error: &ProviderError) -> bool {
        error.retryable && attempt < self.max_attempts
    }

    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let unbounded = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(unbounded.min(self.max_backoff.as_secs_f64()))
    }
}

pub trait GatewayOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _gateway: GatewayId, _operation: &str, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _gateway: GatewayId,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
    }

    fn on_success(&self, _gateway: GatewayId, _operation: &str, _attempts: u32) {}

    fn on_failure(
        &self,
        _gateway: GatewayId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGatewayHooks;

impl GatewayOperationHooks for NoopGatewayHooks {}

pub async fn execute_with_retry<T, Op, OpFuture, Sleep, SleepFuture>(
    gateway: GatewayId,
    operation: &str,
    policy: &RetryPolicy,
    hooks: &dyn GatewayOperationHooks,
    mut execute: Op,
    mut sleep: Sleep,
) -> Result<T, ProviderError>
where
    Op: FnMut(u32) -> OpFuture,
    OpFuture: Future<Output = Result<T, ProviderError>>,
    Sleep: FnMut(Duration) -> SleepFuture,
    SleepFuture: Future<Output = ()>,
{
    let mut attempt = 1;

    loop {
        hooks.on_attempt_start(gateway, operation, attempt);

        match execute(attempt).await {
            Ok(value) => {
                hooks.on_success(gateway, operation, attempt);
                return Ok(value);
            }
            Err(error) if policy.should_retry(attempt, &error) => {
                let delay = policy.backoff_for_attempt(attempt);
                hooks.on_retry_scheduled(gateway, operation, attempt, delay, &error);
                tracing::debug!(
                    gateway = %gateway,
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrying gateway operation"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                hooks.on_failure(gateway, operation, attempt, &error);
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;
    use crate::ProviderErrorKind;

    #[test]
    fn retry_policy_uses_retryable_flag_and_attempt_limit() {
        let policy = RetryPolicy::new(3);
        let retryable = ProviderError::rate_limited("slow down");
        let non_retryable = ProviderError::authentication("bad key");

        assert!(policy.should_retry(1, &retryable));
        assert!(policy.should_retry(2, &retryable));
        assert!(!policy.should_retry(3, &retryable));
        assert!(!policy.should_retry(1, &non_retryable));
        assert!(!RetryPolicy::no_retry().should_retry(1, &retryable));
    }

    #[test]
    fn retry_policy_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(300),
            backoff_multiplier: 2.0,
        };

        assert_eq!(policy.backoff_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for_attempt(3), Duration::from_millis(300));
        assert_eq!(policy.backoff_for_attempt(9), Duration::from_millis(300));
    }

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
    }

    impl RecordingHooks {
        fn push(&self, event: String) {
            self.events.lock().expect("events lock").push(event);
        }
    }

    impl GatewayOperationHooks for RecordingHooks {
        fn on_attempt_start(&self, gateway: GatewayId, operation: &str, attempt: u32) {
            self.push(format!("start:{gateway}:{operation}:{attempt}"));
        }

        fn on_retry_scheduled(
            &self,
            gateway: GatewayId,
            operation: &str,
            attempt: u32,
            _delay: Duration,
            _error: &ProviderError,
        ) {
            self.push(format!("retry:{gateway}:{operation}:{attempt}"));
        }

        fn on_success(&self, gateway: GatewayId, operation: &str, attempts: u32) {
            self.push(format!("success:{gateway}:{operation}:{attempts}"));
        }

        fn on_failure(
            &self,
            gateway: GatewayId,
            operation: &str,
            attempts: u32,
            error: &ProviderError,
        ) {
            self.push(format!(
                "failure:{gateway}:{operation}:{attempts}:{:?}",
                error.kind
            ));
        }
    }

    #[tokio::test]
    async fn execute_with_retry_retries_transient_errors_then_succeeds() {
        let policy = RetryPolicy::new(3);
        let hooks = RecordingHooks::default();
        let sleeps = Arc::new(Mutex::new(Vec::new()));

        let result = execute_with_retry(
            GatewayId::GigaChat,
            "complete",
            &policy,
            &hooks,
            |attempt| async move {
                if attempt < 3 {
                    Err(ProviderError::unavailable("502"))
                } else {
                    Ok(attempt)
                }
            },
            {
                let sleeps = Arc::clone(&sleeps);
                move |delay| {
                    let sleeps = Arc::clone(&sleeps);
                    async move {
                        sleeps.lock().expect("sleep lock").push(delay);
                    }
                }
            },
        )
        .await;

        assert_eq!(result.expect("result should succeed"), 3);
        assert_eq!(sleeps.lock().expect("sleep lock").len(), 2);

        let events = hooks.events.lock().expect("events lock").clone();
        assert_eq!(events.first().map(String::as_str), Some("start:gigachat:complete:1"));
        assert!(events.contains(&"retry:gigachat:complete:2".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("success:gigachat:complete:3"));
    }

    #[tokio::test]
    async fn execute_with_retry_stops_on_non_retryable_error() {
        let policy = RetryPolicy::new(5);
        let hooks = RecordingHooks::default();

        let result = execute_with_retry::<(), _, _, _, _>(
            GatewayId::GigaChat,
            "complete",
            &policy,
            &hooks,
            |_| async move { Err(ProviderError::invalid_request("bad input")) },
            |_| async move {},
        )
        .await;

        let error = result.expect_err("result should fail");
        assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
        let events = hooks.events.lock().expect("events lock").clone();
        assert!(
            events
                .iter()
                .any(|item| item == "failure:gigachat:complete:1:InvalidRequest")
        );
    }
}
