use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::{GiveawayError, GiveawayResult, StoreResult};

/// Bounded exponential backoff for store writes that must not be lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempts run out.
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> GiveawayResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(GiveawayError::Store(e)),
                Err(e) if attempt >= max_attempts => {
                    return Err(GiveawayError::StoreUnavailable {
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    let backoff = self.backoff_for(attempt);
                    warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        what, attempt, max_attempts, backoff, e
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(300),
        }
    }

    #[test]
    fn test_backoff_doubles_up_to_the_cap() {
        let policy = policy();
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(300));
        assert_eq!(policy.backoff_for(40), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let result = policy()
            .run("test write", move || async move {
                let calls = calls_ref;
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StoreError::Unavailable(eyre::eyre!("connection reset")))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_is_surfaced() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let result: GiveawayResult<()> = policy()
            .run("test write", move || async move {
                let calls = calls_ref;
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Unavailable(eyre::eyre!("connection refused")))
            })
            .await;

        assert!(matches!(
            result,
            Err(GiveawayError::StoreUnavailable { attempts: 4, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let calls_ref = &calls;

        let result: GiveawayResult<()> = policy()
            .run("test write", move || async move {
                let calls = calls_ref;
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Corrupt("bad row".into()))
            })
            .await;

        assert!(matches!(result, Err(GiveawayError::Store(StoreError::Corrupt(_)))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
