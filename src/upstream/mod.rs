//! Upstream match API access.
//!
//! Three idempotent reads are all the ladder needs: resolve an account by
//! name, list an account's match ids, and fetch a match.
//!
//! # Trait-based API
//!
//! The [`MatchSource`] trait abstracts those reads so that:
//! - [`RiotClient`] talks HTTP
//! - [`ThrottledClient`] wraps any source with the shared throttler and
//!   bounded retries
//! - tests plug in in-memory fakes
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use match_ladder::clock::SystemClock;
//! use match_ladder::throttle::{ThrottleConfig, Throttler};
//! use match_ladder::upstream::{MatchSource, RiotClient, ThrottledClient};
//!
//! let throttler = Arc::new(Throttler::new(ThrottleConfig::default(), Arc::new(SystemClock)));
//! let source = ThrottledClient::new(RiotClient::new(), throttler);
//! let account = source.resolve_account("Faker", "KR1").await?;
//! ```

mod client;
mod endpoints;
mod throttled;
mod traits;
mod types;

pub use client::{RiotClient, RiotClientBuilder};
pub use endpoints::*;
pub use throttled::{DEFAULT_MAX_ATTEMPTS, ThrottledClient};
pub use traits::MatchSource;
pub use types::*;
