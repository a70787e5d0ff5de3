//! Tests for the rate limiter and retry loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use storygen_error::{GeminiError, GeminiErrorKind};
use storygen_rate_limit::{RateLimiter, RetryPolicy, TierConfig};

fn tier(rpm: Option<u32>, max_concurrent: Option<u32>) -> TierConfig {
    TierConfig {
        rpm,
        max_concurrent,
        ..TierConfig::unlimited()
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        initial_backoff_ms: 1,
        max_retries: 3,
        max_delay_secs: 1,
    }
}

#[tokio::test]
async fn test_unlimited_tier_never_blocks() {
    let limiter = RateLimiter::new(TierConfig::unlimited());
    for _ in 0..100 {
        assert!(limiter.try_acquire(1000).is_some());
    }
}

#[tokio::test]
async fn test_concurrency_limit_enforced() {
    let limiter = RateLimiter::new(tier(None, Some(1)));

    let guard = limiter.try_acquire(1).unwrap();
    assert!(limiter.try_acquire(1).is_none());
    drop(guard);
    assert!(limiter.try_acquire(1).is_some());
}

#[tokio::test]
async fn test_rpm_burst_exhausts() {
    let limiter = RateLimiter::new(tier(Some(2), None));

    assert!(limiter.try_acquire(1).is_some());
    assert!(limiter.try_acquire(1).is_some());
    assert!(limiter.try_acquire(1).is_none());
}

#[tokio::test]
async fn test_execute_retries_transient_errors() {
    let limiter = RateLimiter::new(TierConfig::unlimited()).with_retry_policy(fast_retry());
    let attempts = Arc::new(AtomicUsize::new(0));

    let result: Result<&str, GeminiError> = limiter
        .execute(10, || {
            let attempts = attempts.clone();
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(GeminiError::new(GeminiErrorKind::HttpError {
                        status_code: 503,
                        message: "overloaded".to_string(),
                    }))
                } else {
                    Ok("story")
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "story");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_execute_fails_fast_on_permanent_errors() {
    let limiter = RateLimiter::new(TierConfig::unlimited()).with_retry_policy(fast_retry());
    let attempts = Arc::new(AtomicUsize::new(0));

    let result: Result<(), GeminiError> = limiter
        .execute(10, || {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(GeminiError::new(GeminiErrorKind::HttpError {
                    status_code: 401,
                    message: "unauthorized".to_string(),
                }))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_execute_gives_up_after_max_retries() {
    let limiter = RateLimiter::new(TierConfig::unlimited()).with_retry_policy(fast_retry());
    let attempts = Arc::new(AtomicUsize::new(0));

    let result: Result<(), GeminiError> = limiter
        .execute(10, || {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(GeminiError::new(GeminiErrorKind::HttpError {
                    status_code: 429,
                    message: "quota".to_string(),
                }))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_no_retry_policy() {
    let limiter = RateLimiter::new(TierConfig::unlimited()).with_retry_policy(RetryPolicy::none());
    let attempts = Arc::new(AtomicUsize::new(0));

    let _: Result<(), GeminiError> = limiter
        .execute(10, || {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(GeminiError::new(GeminiErrorKind::HttpError {
                    status_code: 503,
                    message: "overloaded".to_string(),
                }))
            }
        })
        .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
