use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sched_api::ApiError;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::scan_types::ScanError;

/// Delay schedule applied when the upstream signals a rate limit without an
/// explicit retry-after.
const RETRY_DELAYS: [Duration; 4] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(5),
    Duration::from_secs(10),
];

/// Executes upstream calls under a shared concurrency bound, retrying on
/// rate-limit signals.
///
/// One instance is shared by every outstanding request in a run; callers
/// queued beyond the permit count wait in FIFO order (tokio semaphores are
/// fair).
pub struct RateLimitedClient {
    permits: Arc<Semaphore>,
}

impl RateLimitedClient {
    /// Create a client with `concurrency` permits shared by all callers.
    pub fn new(concurrency: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(concurrency)),
        }
    }

    /// Run `request` under one permit.
    ///
    /// The permit is released when the call resolves, success or failure. On
    /// a rate-limit signal the request is retried up to four times using the
    /// delay schedule, unless the upstream names an explicit retry delay,
    /// which takes precedence. Any other failure propagates immediately.
    pub async fn execute<T, F, Fut>(&self, request: F) -> Result<T, ScanError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ScanError::Upstream("Concurrency limiter closed".to_string()))?;

        let mut attempt = 0;
        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(ApiError::RateLimited { retry_after }) if attempt < RETRY_DELAYS.len() => {
                    let delay = retry_after
                        .map(Duration::from_secs)
                        .unwrap_or(RETRY_DELAYS[attempt]);
                    attempt += 1;
                    debug!(
                        "Rate limited, retry {}/{} in {:?}",
                        attempt,
                        RETRY_DELAYS.len(),
                        delay
                    );
                    sleep(delay).await;
                }
                Err(ApiError::RateLimited { .. }) => {
                    warn!("Rate limit retries exhausted");
                    return Err(ScanError::RateLimitExceeded);
                }
                Err(other) => return Err(ScanError::Upstream(other.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_success_passes_through() {
        let client = RateLimitedClient::new(8);
        let result = client.execute(|| async { Ok::<_, ApiError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_non_rate_limit_error_is_not_retried() {
        let client = RateLimitedClient::new(8);
        let calls = AtomicUsize::new(0);

        let result = client
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(ApiError::NotFound) }
            })
            .await;

        assert!(matches!(result, Err(ScanError::Upstream(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhaust_to_rate_limit_exceeded() {
        let client = RateLimitedClient::new(8);
        let calls = AtomicUsize::new(0);

        let result = client
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(ApiError::RateLimited { retry_after: None }) }
            })
            .await;

        assert!(matches!(result, Err(ScanError::RateLimitExceeded)));
        // Initial attempt plus four retries
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_rate_limit() {
        let client = RateLimitedClient::new(8);
        let calls = AtomicUsize::new(0);

        let result = client
            .execute(|| {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(ApiError::RateLimited { retry_after: None })
                    } else {
                        Ok("booked")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "booked");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_retry_after_takes_precedence() {
        let client = RateLimitedClient::new(8);
        let calls = AtomicUsize::new(0);
        let start = tokio::time::Instant::now();

        let result = client
            .execute(|| {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(ApiError::RateLimited {
                            retry_after: Some(30),
                        })
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        // The 30s upstream delay wins over the 1s schedule entry
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let client = Arc::new(RateLimitedClient::new(2));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let client = client.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                client
                    .execute(|| {
                        let in_flight = in_flight.clone();
                        let peak = peak.clone();
                        async move {
                            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(current, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            in_flight.fetch_sub(1, Ordering::SeqCst);
                            Ok::<_, ApiError>(())
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
