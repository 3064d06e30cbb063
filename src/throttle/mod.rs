//! Outbound request throttling.
//!
//! The upstream API enforces two limits at once, each as a sliding window:
//!
//! - **Long window**: 100 requests per 120 seconds
//! - **Short window**: 20 requests per second
//!
//! Both are enforced one below the published cap to leave headroom. A
//! [`Throttler`] owns one [`SlidingWindow`] per limit and only lets a request
//! through when both windows have room; otherwise it sleeps on its
//! [`Clock`](crate::clock::Clock) and re-checks.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use match_ladder::clock::ManualClock;
//! use match_ladder::throttle::{ThrottleConfig, Throttler, WindowLimit};
//! use time::macros::datetime;
//!
//! # tokio_test::block_on(async {
//! let clock = Arc::new(ManualClock::new(datetime!(2024-06-01 0:00 UTC)));
//! let throttler = Throttler::new(
//!     ThrottleConfig {
//!         long: WindowLimit::new(Duration::from_secs(10), 5),
//!         short: WindowLimit::new(Duration::from_secs(1), 2),
//!     },
//!     clock.clone(),
//! );
//!
//! throttler.acquire().await;
//! throttler.acquire().await;
//! // Short window is full: the third call waits one second.
//! throttler.acquire().await;
//! assert_eq!(clock.total_slept(), Duration::from_secs(1));
//! # });
//! ```

mod throttler;
mod window;

pub use throttler::Throttler;
pub use window::{SlidingWindow, WindowLimit};

use std::time::Duration;

/// Throttler configuration: the two windows it enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Longer-period, larger-burst limit. Checked first.
    pub long: WindowLimit,
    /// Fine-grained limit.
    pub short: WindowLimit,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            long: WindowLimit::new(
                Duration::from_secs(limits::LONG_WINDOW_SECS),
                limits::LONG_WINDOW_MAX_REQUESTS,
            ),
            short: WindowLimit::new(
                Duration::from_secs(limits::SHORT_WINDOW_SECS),
                limits::SHORT_WINDOW_MAX_REQUESTS,
            ),
        }
    }
}

/// Upstream rate limit constants for a development API key.
pub mod limits {
    /// Long window length.
    pub const LONG_WINDOW_SECS: u64 = 120;
    /// Requests allowed per long window (upstream cap is 100).
    pub const LONG_WINDOW_MAX_REQUESTS: u32 = 99;
    /// Short window length.
    pub const SHORT_WINDOW_SECS: u64 = 1;
    /// Requests allowed per short window (upstream cap is 20).
    pub const SHORT_WINDOW_MAX_REQUESTS: u32 = 19;
}
