//! Domain types shared by the collector, the aggregator and the store.

pub mod account;
pub mod stats;

pub use account::Account;
pub use stats::{BatchSummary, MatchRecord, ParticipantStat, PersistedAggregate, StatLine};
