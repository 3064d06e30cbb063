//! Dual-window throttler.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::throttle::{SlidingWindow, ThrottleConfig};

/// Gate that every outbound request passes through.
///
/// [`acquire`](Throttler::acquire) never fails: it returns once one more
/// request fits under both windows, sleeping on the clock as long as
/// necessary. Wrap the call in a timeout if bounded latency matters.
///
/// A throttler is meant to be shared (`Arc<Throttler>`) by every client that
/// talks to the same upstream key.
pub struct Throttler {
    clock: Arc<dyn Clock>,
    windows: Mutex<Windows>,
}

#[derive(Debug)]
struct Windows {
    long: SlidingWindow,
    short: SlidingWindow,
}

impl Windows {
    /// Evict, check, and record as one step.
    ///
    /// The long window is checked first so a coarse-limit violation is never
    /// masked by a fine-grained wait.
    fn try_acquire(&mut self, now: OffsetDateTime) -> Result<(), Duration> {
        self.long.evict(now);
        self.short.evict(now);

        if self.long.is_full() {
            return Err(self.long.wait_time(now));
        }
        if self.short.is_full() {
            return Err(self.short.wait_time(now));
        }

        self.long.record(now);
        self.short.record(now);
        Ok(())
    }
}

impl Throttler {
    /// Create a throttler enforcing `config`, reading time from `clock`.
    pub fn new(config: ThrottleConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            windows: Mutex::new(Windows {
                long: SlidingWindow::new(config.long),
                short: SlidingWindow::new(config.short),
            }),
        }
    }

    /// Wait until one more request is allowed, then record it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                match windows.try_acquire(self.clock.now()) {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };

            if wait.is_zero() {
                tokio::task::yield_now().await;
                continue;
            }

            tracing::debug!(wait_ms = wait.as_millis() as u64, "throttling upstream request");
            self.clock.sleep(wait).await;
        }
    }

    /// The clock this throttler sleeps on.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Requests currently recorded in the `(long, short)` windows.
    pub async fn in_window(&self) -> (usize, usize) {
        let mut windows = self.windows.lock().await;
        let now = self.clock.now();
        windows.long.evict(now);
        windows.short.evict(now);
        (windows.long.len(), windows.short.len())
    }
}

impl std::fmt::Debug for Throttler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::throttle::WindowLimit;
    use time::macros::datetime;

    const T0: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

    fn throttler(config: ThrottleConfig) -> (Arc<ManualClock>, Throttler) {
        let clock = Arc::new(ManualClock::new(T0));
        let throttler = Throttler::new(config, clock.clone());
        (clock, throttler)
    }

    /// Max number of timestamps falling in any half-open window of `span`.
    fn max_in_any_window(stamps: &[OffsetDateTime], span: Duration) -> usize {
        stamps
            .iter()
            .enumerate()
            .map(|(i, end)| {
                stamps[..=i]
                    .iter()
                    .filter(|ts| Duration::try_from(*end - **ts).unwrap_or_default() < span)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_short_window_waits_one_second() {
        let (clock, throttler) = throttler(ThrottleConfig::default());

        for _ in 0..19 {
            throttler.acquire().await;
        }
        assert!(clock.sleeps().is_empty());

        throttler.acquire().await;
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
        assert_eq!(clock.now(), T0 + Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_long_window_wait_formula() {
        let (clock, throttler) = throttler(ThrottleConfig::default());

        for _ in 0..99 {
            throttler.acquire().await;
            clock.advance(Duration::from_millis(1100));
        }
        // Oldest request is 108.9s old, so the 100th waits 11.1s.
        throttler.acquire().await;
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(11_100)]);
        assert_eq!(throttler.in_window().await, (99, 1));
    }

    #[tokio::test]
    async fn test_default_limits_never_exceeded() {
        let (clock, throttler) = throttler(ThrottleConfig::default());
        let mut stamps = Vec::new();

        // Bursty caller: mostly back-to-back, with occasional pauses.
        let mut seed: u64 = 7;
        for _ in 0..400 {
            throttler.acquire().await;
            stamps.push(clock.now());
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            if seed % 5 == 0 {
                clock.advance(Duration::from_millis(seed % 700));
            }
        }

        assert!(max_in_any_window(&stamps, Duration::from_secs(120)) <= 99);
        assert!(max_in_any_window(&stamps, Duration::from_secs(1)) <= 19);
    }

    #[tokio::test]
    async fn test_zero_limit_waits_instead_of_spinning() {
        let config = ThrottleConfig {
            long: WindowLimit {
                duration: Duration::from_secs(2),
                max_requests: 0,
            },
            short: WindowLimit::new(Duration::from_secs(1), 5),
        };
        let (clock, throttler) = throttler(config);

        throttler.acquire().await;
        throttler.acquire().await;
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_rechecks_short_window_after_long_wait() {
        // The short window is longer than the long window's remaining wait,
        // so waking up from the long wait still finds the short window full.
        let config = ThrottleConfig {
            long: WindowLimit::new(Duration::from_secs(4), 3),
            short: WindowLimit::new(Duration::from_secs(3), 2),
        };
        let (clock, throttler) = throttler(config);
        let mut stamps = Vec::new();

        for _ in 0..12 {
            throttler.acquire().await;
            stamps.push(clock.now());
            clock.advance(Duration::from_millis(900));
        }

        assert!(max_in_any_window(&stamps, Duration::from_secs(4)) <= 3);
        assert!(max_in_any_window(&stamps, Duration::from_secs(3)) <= 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_limits() {
        let (clock, throttler) = throttler(ThrottleConfig::default());
        let throttler = Arc::new(throttler);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let throttler = throttler.clone();
            let clock = clock.clone();
            handles.push(tokio::spawn(async move {
                let mut stamps = Vec::new();
                for _ in 0..10 {
                    throttler.acquire().await;
                    stamps.push(clock.now());
                }
                stamps
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        all.sort();

        assert_eq!(all.len(), 80);
        assert!(max_in_any_window(&all, Duration::from_secs(1)) <= 19);
    }
}
