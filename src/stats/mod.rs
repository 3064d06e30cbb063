//! Incremental statistics aggregation.
//!
//! A refresh cycle turns freshly collected matches into one [`BatchSummary`]
//! per account ([`aggregate`]) and folds each summary into the account's
//! stored aggregate ([`merge`]).
//!
//! ```
//! use match_ladder::stats::{merge, DEFAULT_LEDGER_CAPACITY};
//! use match_ladder::types::{BatchSummary, StatLine};
//!
//! let batch = |games, avg_damage| BatchSummary {
//!     games,
//!     averages: StatLine { avg_damage, ..StatLine::default() },
//!     damage_record: avg_damage,
//!     match_ids: Vec::new(),
//! };
//!
//! let first = merge(None, "puuid", &batch(10, 100.0), DEFAULT_LEDGER_CAPACITY);
//! let second = merge(Some(&first), "puuid", &batch(5, 130.0), DEFAULT_LEDGER_CAPACITY);
//! assert_eq!(second.number_of_games, 15);
//! assert!((second.averages.avg_damage - 110.0).abs() < 1e-9);
//! ```
//!
//! [`BatchSummary`]: crate::types::BatchSummary

mod aggregate;
mod merge;

pub use aggregate::{Game, aggregate, group_by_account, skip_merged, summarize};
pub use merge::{DEFAULT_LEDGER_CAPACITY, merge};

/// Decimal places kept when an aggregate is persisted.
pub const PERSISTED_PRECISION: i32 = 2;
