//! Retry helper for transient failures in async calls (product lookups over HTTP)

use std::time::Duration;
use tokio::time::sleep;

/// How many times to try and how long to wait between attempts
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Run `operation` until it succeeds, `is_transient` rejects the error, or the
/// attempts run out. The last error is returned.
///
/// # Examples
/// ```rust
/// use listscan::core::retry::{retry_async, RetryPolicy};
///
/// # async fn example() -> Result<u32, String> {
/// let price_cents = retry_async(
///     "product_lookup",
///     RetryPolicy::default(),
///     |_: &String| true,
///     || async { Ok::<u32, String>(1299) },
/// )
/// .await?;
/// # Ok(price_cents)
/// # }
/// ```
pub async fn retry_async<F, T, E, Fut, P>(
    operation_name: &str,
    policy: RetryPolicy,
    is_transient: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) if attempt < attempts && is_transient(&error) => {
                log::debug!(
                    "Operation '{}' failed on attempt {}/{}, retrying in {:?}: {}",
                    operation_name,
                    attempt,
                    attempts,
                    policy.delay,
                    error
                );
                sleep(policy.delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn quick(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_immediately() {
        let result = retry_async("lookup", RetryPolicy::default(), |_: &String| true, || async {
            Ok::<i32, String>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let attempt_count = Arc::new(AtomicUsize::new(0));

        let result = retry_async("lookup", quick(3), |_: &&str| true, || {
            let count = attempt_count.clone();
            async move {
                if count.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("temporary failure")
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausts_attempts() {
        let attempt_count = Arc::new(AtomicUsize::new(0));

        let result = retry_async("lookup", quick(2), |_: &&str| true, || {
            let count = attempt_count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Err::<i32, &str>("persistent failure")
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "persistent failure");
        assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let attempt_count = Arc::new(AtomicUsize::new(0));

        let result = retry_async(
            "lookup",
            quick(5),
            |error: &&str| *error != "not found",
            || {
                let count = attempt_count.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, &str>("not found")
                }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempt_count.load(Ordering::SeqCst), 1);
    }
}
