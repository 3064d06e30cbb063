//! # Match Ladder
//!
//! An async library that tracks a roster of game accounts, pulls their match
//! history from the rate-limited Riot API, and keeps running per-account
//! performance aggregates for a leaderboard.
//!
//! ## Features
//!
//! - Dual sliding-window throttling of every upstream request
//! - Incremental weighted-average aggregation with a processed-match ledger
//! - Single-flight refresh cycles behind a cooldown
//! - Injected clock and store for deterministic tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use match_ladder::clock::SystemClock;
//! use match_ladder::config::{LadderConfig, UpstreamConfig};
//! use match_ladder::leaderboard::Metric;
//! use match_ladder::service::Ladder;
//! use match_ladder::store::MemoryStore;
//! use match_ladder::throttle::{ThrottleConfig, Throttler};
//! use match_ladder::upstream::ThrottledClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let clock = Arc::new(SystemClock);
//!     let throttler = Arc::new(Throttler::new(ThrottleConfig::default(), clock.clone()));
//!     let source = ThrottledClient::new(UpstreamConfig::from_env()?.client(), throttler);
//!     let ladder = Ladder::new(source, MemoryStore::new(), clock, LadderConfig::from_env()?);
//!
//!     ladder.add_account("Faker", "KR1").await?;
//!     for row in ladder.view_leaderboard(Metric::Kda).await? {
//!         println!("{}) {}#{} kda {:.2}", row.rank, row.display_name, row.tag_line, row.kda);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod clock;
pub mod collector;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod service;
pub mod stats;
pub mod store;
pub mod throttle;
pub mod types;
pub mod upstream;

// Re-export commonly used types at crate root
pub use error::{LadderError, StoreError, UpstreamError};
pub use service::{Ladder, RefreshOutcome};
pub use types::{Account, PersistedAggregate};

/// Result type alias using LadderError
pub type Result<T> = std::result::Result<T, LadderError>;
