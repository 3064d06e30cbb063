//! Merging a batch into a running aggregate.

use crate::types::{BatchSummary, PersistedAggregate, StatLine};

/// Default number of merged match ids kept per aggregate.
pub const DEFAULT_LEDGER_CAPACITY: usize = 500;

/// Merge `batch` into `existing` (absent for a new account).
///
/// Every averaged field is the game-weighted mean of both sides, the damage
/// record is the larger of the two, and the batch's match ids are appended to
/// the ledger, keeping at most `ledger_capacity` of the newest. A batch with
/// no games leaves the aggregate unchanged.
///
/// No rounding is applied here; see [`PersistedAggregate::rounded`].
pub fn merge(
    existing: Option<&PersistedAggregate>,
    external_id: &str,
    batch: &BatchSummary,
    ledger_capacity: usize,
) -> PersistedAggregate {
    let base = existing.cloned().unwrap_or_else(|| PersistedAggregate {
        external_id: external_id.to_string(),
        number_of_games: 0,
        averages: StatLine::default(),
        damage_record: 0.0,
        recent_matches: Default::default(),
    });

    if batch.is_empty() {
        return base;
    }

    let total_games = base.number_of_games + batch.games;
    let averages = if base.number_of_games == 0 {
        batch.averages
    } else {
        let old_weight = base.number_of_games as f64;
        let new_weight = batch.games as f64;
        let total = total_games as f64;
        base.averages.zip_with(&batch.averages, |old, new| {
            (old * old_weight + new * new_weight) / total
        })
    };

    let mut recent_matches = base.recent_matches;
    recent_matches.extend(batch.match_ids.iter().cloned());
    while recent_matches.len() > ledger_capacity {
        recent_matches.pop_front();
    }

    PersistedAggregate {
        external_id: base.external_id,
        number_of_games: total_games,
        averages,
        damage_record: base.damage_record.max(batch.damage_record),
        recent_matches,
    }
}
