//! Sliding window request counting.

use std::collections::VecDeque;
use std::time::Duration;

use time::OffsetDateTime;

/// A `(duration, max_requests)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimit {
    /// Window length.
    pub duration: Duration,
    /// Maximum requests recorded within any window of `duration`.
    pub max_requests: u32,
}

impl WindowLimit {
    /// Create a new window limit. A zero `max_requests` is raised to 1.
    pub const fn new(duration: Duration, max_requests: u32) -> Self {
        Self {
            duration,
            max_requests: if max_requests == 0 { 1 } else { max_requests },
        }
    }
}

/// A sliding window rate limiter.
///
/// Tracks request timestamps within a sliding window and enforces a maximum
/// number of requests within that window. Time is always passed in, so the
/// window itself never looks at a clock.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    /// Request timestamps, oldest first.
    requests: VecDeque<OffsetDateTime>,
    limit: WindowLimit,
}

impl SlidingWindow {
    /// Create a new sliding window.
    ///
    /// A limit built by hand with `max_requests == 0` is treated as 1, so a
    /// full window always has an entry to wait on.
    pub fn new(limit: WindowLimit) -> Self {
        let limit = WindowLimit::new(limit.duration, limit.max_requests);
        Self {
            requests: VecDeque::with_capacity(limit.max_requests as usize),
            limit,
        }
    }

    /// The limit this window enforces.
    pub fn limit(&self) -> WindowLimit {
        self.limit
    }

    /// Drop every timestamp that is at least one window old at `now`.
    pub fn evict(&mut self, now: OffsetDateTime) {
        while let Some(oldest) = self.requests.front() {
            if age(now, *oldest) >= self.limit.duration {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }

    /// Whether the window has reached its cap. Call [`evict`](Self::evict) first.
    pub fn is_full(&self) -> bool {
        self.requests.len() as u64 >= u64::from(self.limit.max_requests)
    }

    /// How long until the oldest recorded request leaves the window.
    ///
    /// Zero when the window is empty or the oldest entry has already expired.
    pub fn wait_time(&self, now: OffsetDateTime) -> Duration {
        self.requests
            .front()
            .map(|oldest| self.limit.duration.saturating_sub(age(now, *oldest)))
            .unwrap_or_default()
    }

    /// Record a request at `now`.
    pub fn record(&mut self, now: OffsetDateTime) {
        self.requests.push_back(now);
    }

    /// Try to record a request at `now`.
    ///
    /// Returns `Ok(())` if allowed, `Err(wait_time)` if the window is full.
    pub fn try_acquire(&mut self, now: OffsetDateTime) -> Result<(), Duration> {
        self.evict(now);
        if self.is_full() {
            Err(self.wait_time(now))
        } else {
            self.record(now);
            Ok(())
        }
    }

    /// Number of requests currently recorded.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Check if no requests are recorded.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Remaining permits, as of the last eviction.
    pub fn remaining(&self) -> u32 {
        self.limit
            .max_requests
            .saturating_sub(self.requests.len() as u32)
    }
}

/// Elapsed time from `then` to `now`; zero if the clock went backwards.
fn age(now: OffsetDateTime, then: OffsetDateTime) -> Duration {
    Duration::try_from(now - then).unwrap_or_default()
}
