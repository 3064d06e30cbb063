//! Per-batch summaries.

use std::collections::BTreeMap;

use crate::types::{BatchSummary, MatchRecord, ParticipantStat, PersistedAggregate, StatLine};

/// One account's game: the match id and its numbers.
pub type Game = (String, ParticipantStat);

/// Group every participant entry by owning account.
///
/// Games keep the match order of `matches`.
pub fn group_by_account(matches: &BTreeMap<String, MatchRecord>) -> BTreeMap<String, Vec<Game>> {
    let mut grouped: BTreeMap<String, Vec<Game>> = BTreeMap::new();
    for (match_id, record) in matches {
        for participant in &record.participants {
            grouped
                .entry(participant.external_id.clone())
                .or_default()
                .push((match_id.clone(), participant.clone()));
        }
    }
    grouped
}

/// Drop games whose match was already merged into `existing`.
pub fn skip_merged(games: Vec<Game>, existing: Option<&PersistedAggregate>) -> Vec<Game> {
    match existing {
        Some(aggregate) => games
            .into_iter()
            .filter(|(match_id, _)| !aggregate.has_merged(match_id))
            .collect(),
        None => games,
    }
}

/// Summarize one account's games.
///
/// Minions per minute is computed per game and then averaged. An empty
/// slice yields [`BatchSummary::empty`].
pub fn summarize(games: &[Game]) -> BatchSummary {
    if games.is_empty() {
        return BatchSummary::empty();
    }

    let mut totals = StatLine::default();
    let mut damage_record = 0.0f64;
    for (_, game) in games {
        totals = totals.zip_with(&StatLine::from_game(game), |sum, value| sum + value);
        damage_record = damage_record.max(game.damage_to_champions);
    }

    let count = games.len() as f64;
    BatchSummary {
        games: games.len() as u64,
        averages: totals.map(|sum| sum / count),
        damage_record,
        match_ids: games.iter().map(|(match_id, _)| match_id.clone()).collect(),
    }
}

/// Summarize every account present in `matches`.
pub fn aggregate(matches: &BTreeMap<String, MatchRecord>) -> BTreeMap<String, BatchSummary> {
    group_by_account(matches)
        .into_iter()
        .map(|(external_id, games)| (external_id, summarize(&games)))
        .collect()
}
