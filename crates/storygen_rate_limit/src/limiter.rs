//! Rate limiter implementation using governor and Tokio Semaphore.
//!
//! - Governor (GCRA) for RPM, TPM, and RPD limits
//! - Tokio Semaphore for concurrent request limits

use crate::Tier;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use storygen_error::RetryableError;
use tokio::sync::Semaphore;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Backoff settings used by [`RateLimiter::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum number of retries after the first attempt.
    pub max_retries: usize,
    /// Upper bound on a single delay, in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 2000,
            max_retries: 5,
            max_delay_secs: 60,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            initial_backoff_ms: 0,
            max_retries: 0,
            max_delay_secs: 0,
        }
    }
}

/// Rate limiter that enforces multiple quota types.
///
/// The limiter takes ownership of a value implementing `Tier` and exposes it
/// through [`RateLimiter::inner`], so a tier-aware client can be wrapped
/// directly.
#[derive(Clone)]
pub struct RateLimiter<T: Tier> {
    inner: T,
    rpm_limiter: Option<Arc<DirectRateLimiter>>,
    tpm_limiter: Option<Arc<DirectRateLimiter>>,
    rpd_limiter: Option<Arc<DirectRateLimiter>>,
    concurrent_semaphore: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl<T: Tier> RateLimiter<T> {
    /// Create a new rate limiter from a tier.
    ///
    /// Every non-`None` limit of the tier is enforced.
    pub fn new(tier: T) -> Self {
        let rpm_limiter = tier.rpm().and_then(|rpm| {
            NonZeroU32::new(rpm).map(|n| Arc::new(GovernorRateLimiter::direct(Quota::per_minute(n))))
        });

        // Governor quotas are u32; larger token budgets are capped.
        let tpm_limiter = tier.tpm().and_then(|tpm| {
            NonZeroU32::new(tpm.min(u32::MAX as u64) as u32)
                .map(|n| Arc::new(GovernorRateLimiter::direct(Quota::per_minute(n))))
        });

        let rpd_limiter = tier.rpd().and_then(|rpd| {
            NonZeroU32::new(rpd).and_then(|n| {
                Quota::with_period(Duration::from_secs(86_400) / n.get())
                    .map(|quota| Arc::new(GovernorRateLimiter::direct(quota.allow_burst(n))))
            })
        });

        let permits = tier
            .max_concurrent()
            .map(|n| (n.max(1) as usize).min(Semaphore::MAX_PERMITS))
            .unwrap_or(Semaphore::MAX_PERMITS);
        let concurrent_semaphore = Arc::new(Semaphore::new(permits));

        debug!(
            tier = tier.name(),
            rpm = ?tier.rpm(),
            tpm = ?tier.tpm(),
            rpd = ?tier.rpd(),
            max_concurrent = ?tier.max_concurrent(),
            "Created rate limiter"
        );

        Self {
            inner: tier,
            rpm_limiter,
            tpm_limiter,
            rpd_limiter,
            concurrent_semaphore,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Current retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Get a reference to the inner tier value.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Acquire rate limit permission for a request.
    ///
    /// Waits until RPM, TPM (`estimated_tokens`), RPD, and the concurrency
    /// limit all allow the request. The returned guard releases the
    /// concurrent slot when dropped.
    pub async fn acquire(&self, estimated_tokens: u64) -> RateLimiterGuard {
        if let Some(limiter) = &self.rpm_limiter {
            limiter.until_ready().await;
        }

        if let Some(limiter) = &self.tpm_limiter {
            let tokens = (estimated_tokens.min(u32::MAX as u64) as u32).max(1);
            match NonZeroU32::new(tokens) {
                Some(n) if limiter.until_n_ready(n).await.is_ok() => {}
                // More tokens than the whole quota: wait for one cell per request instead.
                _ => limiter.until_ready().await,
            }
        }

        if let Some(limiter) = &self.rpd_limiter {
            limiter.until_ready().await;
        }

        // The semaphore is never closed, so acquisition only fails on shutdown.
        let permit = self.concurrent_semaphore.clone().acquire_owned().await.ok();

        RateLimiterGuard { _permit: permit }
    }

    /// Try to acquire without waiting.
    ///
    /// Returns `None` if any limit would block.
    pub fn try_acquire(&self, estimated_tokens: u64) -> Option<RateLimiterGuard> {
        if let Some(limiter) = &self.rpm_limiter {
            limiter.check().ok()?;
        }

        if let Some(limiter) = &self.tpm_limiter {
            let tokens = (estimated_tokens.min(u32::MAX as u64) as u32).max(1);
            let n = NonZeroU32::new(tokens)?;
            limiter.check_n(n).ok()?.ok()?;
        }

        if let Some(limiter) = &self.rpd_limiter {
            limiter.check().ok()?;
        }

        let permit = self.concurrent_semaphore.clone().try_acquire_owned().ok()?;

        Some(RateLimiterGuard {
            _permit: Some(permit),
        })
    }

    /// Execute an operation with rate limiting and automatic retry.
    ///
    /// Every attempt acquires rate limit permission first. Errors whose
    /// [`RetryableError::is_retryable`] is true are retried with jittered
    /// exponential backoff; others are returned immediately.
    pub async fn execute<F, Fut, R, E>(&self, estimated_tokens: u64, operation: F) -> Result<R, E>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<R, E>>,
        E: RetryableError + std::fmt::Display,
    {
        let retry_strategy = ExponentialBackoff::from_millis(self.retry.initial_backoff_ms.max(1))
            .factor(2)
            .max_delay(Duration::from_secs(self.retry.max_delay_secs))
            .map(jitter)
            .take(self.retry.max_retries);

        Retry::spawn(retry_strategy, || async {
            let _guard = self.acquire(estimated_tokens).await;

            match operation().await {
                Ok(value) => Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!(tier = self.inner.name(), "Transient error, will retry: {}", e);
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(tier = self.inner.name(), "Permanent error, failing immediately: {}", e);
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await
    }
}

/// RAII guard for rate limiter.
///
/// Releases the concurrent request slot when dropped.
pub struct RateLimiterGuard {
    _permit: Option<tokio::sync::OwnedSemaphorePermit>,
}
