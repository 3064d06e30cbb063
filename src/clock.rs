//! Time sources.
//!
//! Throttling and cooldown decisions read the current time and suspend
//! through a [`Clock`], so tests can drive them with a [`ManualClock`]
//! instead of sleeping for real.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use match_ladder::clock::{Clock, ManualClock};
//! use time::macros::datetime;
//!
//! let clock = ManualClock::new(datetime!(2024-06-01 12:00 UTC));
//! clock.advance(Duration::from_secs(90));
//! assert_eq!(clock.now(), datetime!(2024-06-01 12:01:30 UTC));
//! ```

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::{self, BoxFuture};
use time::OffsetDateTime;

/// Source of the current time and of suspensions.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> OffsetDateTime;

    /// Suspend the caller for `duration`.
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// The real clock, backed by the system time and the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// A clock that only moves when told to.
///
/// `sleep` completes immediately and advances the clock by the requested
/// duration, recording it so tests can assert on how long callers waited.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

#[derive(Debug)]
struct ManualState {
    now: OffsetDateTime,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    /// Create a manual clock starting at `start`.
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: start,
                sleeps: Vec::new(),
            }),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        self.state().now += duration;
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: OffsetDateTime) {
        self.state().now = now;
    }

    /// Every duration passed to [`Clock::sleep`] so far, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state().sleeps.clone()
    }

    /// Sum of all recorded sleeps.
    pub fn total_slept(&self) -> Duration {
        self.state().sleeps.iter().sum()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        self.state().now
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        let mut state = self.state();
        state.now += duration;
        state.sleeps.push(duration);
        Box::pin(future::ready(()))
    }
}
