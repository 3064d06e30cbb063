//! Throttled, retrying [`MatchSource`] wrapper.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use match_ladder::clock::SystemClock;
//! use match_ladder::throttle::{ThrottleConfig, Throttler};
//! use match_ladder::upstream::{RiotClient, ThrottledClient};
//!
//! let throttler = Arc::new(Throttler::new(ThrottleConfig::default(), Arc::new(SystemClock)));
//! let client = ThrottledClient::new(RiotClient::new(), throttler);
//!
//! // Every call waits for the throttler first.
//! let record = client.fetch_match("NA1_4936414515").await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::UpstreamError;
use crate::throttle::Throttler;
use crate::types::{Account, MatchRecord};
use crate::upstream::{MatchIdsRequest, MatchSource};

/// Default number of attempts per logical call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// A wrapper around any [`MatchSource`] that routes every attempt through a
/// shared [`Throttler`].
///
/// Transient failures (rate limited, 5xx, transport) are retried up to
/// `max_attempts` times in total. Each retry re-enters the throttler, and an
/// upstream `Retry-After` hint is honoured on the throttler's clock.
/// [`UpstreamError::NotFound`] is returned straight away.
pub struct ThrottledClient<C> {
    inner: C,
    throttler: Arc<Throttler>,
    max_attempts: u32,
}

impl<C> ThrottledClient<C> {
    /// Wrap `inner`, sharing `throttler` with any other client on the same key.
    pub fn new(inner: C, throttler: Arc<Throttler>) -> Self {
        Self {
            inner,
            throttler,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the total number of attempts per call (at least one).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Get a reference to the inner source.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Get the shared throttler.
    pub fn throttler(&self) -> &Arc<Throttler> {
        &self.throttler
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, mut attempt_fn: F) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let mut attempt = 1;
        loop {
            self.throttler.acquire().await;
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    tracing::warn!(operation, attempt, error = %err, "transient upstream failure, retrying");
                    if let Some(ms) = err.retry_after_ms() {
                        self.throttler.clock().sleep(Duration::from_millis(ms)).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for ThrottledClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottledClient")
            .field("inner", &self.inner)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl<C: Clone> Clone for ThrottledClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            throttler: self.throttler.clone(),
            max_attempts: self.max_attempts,
        }
    }
}

impl<C: MatchSource> MatchSource for ThrottledClient<C> {
    async fn resolve_account(
        &self,
        display_name: &str,
        tag_line: &str,
    ) -> Result<Account, UpstreamError> {
        self.call("resolve_account", move || self.inner.resolve_account(display_name, tag_line))
            .await
    }

    async fn list_match_ids(
        &self,
        external_id: &str,
        request: &MatchIdsRequest,
    ) -> Result<Vec<String>, UpstreamError> {
        self.call("list_match_ids", move || self.inner.list_match_ids(external_id, request))
            .await
    }

    async fn fetch_match(&self, match_id: &str) -> Result<MatchRecord, UpstreamError> {
        self.call("fetch_match", move || self.inner.fetch_match(match_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::clock::ManualClock;
    use crate::throttle::{ThrottleConfig, WindowLimit};
    use time::macros::datetime;

    /// Fails `failures` times with `error`, then succeeds.
    struct Flaky {
        calls: AtomicU32,
        failures: u32,
        error: fn() -> UpstreamError,
    }

    impl MatchSource for Flaky {
        async fn resolve_account(&self, display_name: &str, tag_line: &str) -> Result<Account, UpstreamError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err((self.error)());
            }
            Ok(Account::new(display_name, tag_line, "puuid"))
        }

        async fn list_match_ids(&self, _: &str, _: &MatchIdsRequest) -> Result<Vec<String>, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn fetch_match(&self, match_id: &str) -> Result<MatchRecord, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(UpstreamError::NotFound {
                resource: "match",
                id: match_id.to_string(),
            })
        }
    }

    fn wrap(failures: u32, error: fn() -> UpstreamError) -> (Arc<ManualClock>, ThrottledClient<Flaky>) {
        let clock = Arc::new(ManualClock::new(datetime!(2024-06-01 0:00 UTC)));
        let config = ThrottleConfig {
            long: WindowLimit::new(Duration::from_secs(120), 99),
            short: WindowLimit::new(Duration::from_secs(1), 19),
        };
        let throttler = Arc::new(Throttler::new(config, clock.clone()));
        let inner = Flaky {
            calls: AtomicU32::new(0),
            failures,
            error,
        };
        (clock, ThrottledClient::new(inner, throttler))
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let (clock, client) = wrap(2, || UpstreamError::RateLimited {
            retry_after_ms: Some(2000),
        });

        let account = client.resolve_account("Foo", "NA1").await.unwrap();
        assert_eq!(account.external_id, "puuid");
        assert_eq!(client.inner().calls.load(Ordering::SeqCst), 3);
        assert_eq!(clock.total_slept(), Duration::from_secs(4));
        assert_eq!(client.throttler().in_window().await.0, 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (_clock, client) = wrap(10, || UpstreamError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        });

        let err = client.resolve_account("Foo", "NA1").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 502, .. }));
        assert_eq!(client.inner().calls.load(Ordering::SeqCst), DEFAULT_MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let (_clock, client) = wrap(0, || UpstreamError::InvalidResponse(String::new()));

        let err = client.fetch_match("NA1_1").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(client.inner().calls.load(Ordering::SeqCst), 1);
    }
}
