use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Whether a failed attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// The error was not retryable.
    Fatal(E),
    /// Retryable, but every attempt failed. Holds the last error.
    AttemptsExceeded(E),
    /// Cancellation fired while waiting between attempts.
    Cancelled(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(e) | RetryError::AttemptsExceeded(e) | RetryError::Cancelled(e) => e,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: if max_delay.is_zero() {
                base_delay
            } else {
                max_delay
            },
        }
    }

    /// A single attempt, no backoff.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Runs `op` until it succeeds, `classify` says stop, attempts run out,
    /// or `cancel` fires during a backoff sleep.
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0;

        loop {
            let err = match op().await {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };

            if classify(&err) == RetryDisposition::Stop {
                return Err(RetryError::Fatal(err));
            }
            if attempt + 1 >= self.max_attempts {
                return Err(RetryError::AttemptsExceeded(err));
            }

            let delay = self.backoff_delay(attempt);
            tracing::debug!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "retrying");
            tokio::select! {
                _ = cancel.cancelled() => return Err(RetryError::Cancelled(err)),
                _ = sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let factor = 1u128 << attempt.min(6);
        let delay_ms = self.base_delay.as_millis().saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis());
        Duration::from_millis(capped as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn fast(attempts: usize) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1), Duration::from_millis(2))
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();

        let result = fast(3)
            .run(
                &token,
                || {
                    let calls = calls.clone();
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err("busy")
                        } else {
                            Ok(7)
                        }
                    }
                },
                |_| RetryDisposition::Retry,
            )
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_on_fatal_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();

        let result: Result<(), _> = fast(5)
            .run(
                &token,
                || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err("bad request")
                    }
                },
                |_| RetryDisposition::Stop,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Fatal("bad request"))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let token = CancellationToken::new();
        let result: Result<(), _> = fast(2)
            .run(&token, || async { Err("down") }, |_| RetryDisposition::Retry)
            .await;
        assert!(matches!(result, Err(RetryError::AttemptsExceeded("down"))));
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        let token = CancellationToken::new();
        token.cancel();
        let policy = RetryPolicy::new(5, Duration::from_secs(60), Duration::from_secs(60));

        let result: Result<(), _> = tokio::time::timeout(
            Duration::from_secs(1),
            policy.run(&token, || async { Err("down") }, |_| RetryDisposition::Retry),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(RetryError::Cancelled("down"))));
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(350));
        assert_eq!(RetryPolicy::none().backoff_delay(3), Duration::ZERO);
    }
}
