//! Per-match and aggregated performance statistics.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One account's raw numbers from one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStat {
    /// Owning account.
    pub external_id: String,
    /// Damage dealt to enemy champions.
    pub damage_to_champions: f64,
    /// Damage taken.
    pub damage_taken: f64,
    /// Seconds spent dead.
    pub time_dead: f64,
    /// Wards placed.
    pub wards_placed: f64,
    /// Gold earned.
    pub gold_earned: f64,
    /// Kill/death/assist ratio.
    pub kda: f64,
    /// Kills with no assisting ally.
    pub solo_kills: f64,
    /// Kills plus assists.
    pub takedowns: f64,
    /// Minions killed.
    pub minions_killed: f64,
    /// Seconds played.
    pub time_played: f64,
}

impl ParticipantStat {
    /// Minions killed per minute of this game; zero for a zero-length game.
    pub fn cs_per_min(&self) -> f64 {
        if self.time_played > 0.0 {
            self.minions_killed / self.time_played * 60.0
        } else {
            0.0
        }
    }
}

/// A fetched match, possibly narrowed to tracked participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// Globally unique match id.
    pub match_id: String,
    /// Per-participant stats.
    pub participants: Vec<ParticipantStat>,
}

impl MatchRecord {
    /// Keep only participants for which `keep` returns true.
    pub fn retain_participants(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.participants.retain(|p| keep(&p.external_id));
    }
}

/// The averaged fields of an aggregate.
///
/// Every field follows the same weighted-average law when merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatLine {
    /// Average KDA.
    pub kda: f64,
    /// Average of per-game minions per minute.
    pub cs_per_min: f64,
    /// Average damage to champions.
    pub avg_damage: f64,
    /// Average damage taken.
    #[serde(default)]
    pub avg_damage_taken: f64,
    /// Average gold earned.
    pub avg_gold: f64,
    /// Average seconds spent dead.
    pub avg_time_dead: f64,
    /// Average wards placed.
    #[serde(default)]
    pub avg_wards_placed: f64,
    /// Average solo kills.
    #[serde(default)]
    pub avg_solo_kills: f64,
    /// Average takedowns.
    #[serde(default)]
    pub avg_takedowns: f64,
}

impl StatLine {
    /// The line for a single game.
    pub fn from_game(game: &ParticipantStat) -> Self {
        Self {
            kda: game.kda,
            cs_per_min: game.cs_per_min(),
            avg_damage: game.damage_to_champions,
            avg_damage_taken: game.damage_taken,
            avg_gold: game.gold_earned,
            avg_time_dead: game.time_dead,
            avg_wards_placed: game.wards_placed,
            avg_solo_kills: game.solo_kills,
            avg_takedowns: game.takedowns,
        }
    }

    /// Apply `f` field by field to `self` and `other`.
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            kda: f(self.kda, other.kda),
            cs_per_min: f(self.cs_per_min, other.cs_per_min),
            avg_damage: f(self.avg_damage, other.avg_damage),
            avg_damage_taken: f(self.avg_damage_taken, other.avg_damage_taken),
            avg_gold: f(self.avg_gold, other.avg_gold),
            avg_time_dead: f(self.avg_time_dead, other.avg_time_dead),
            avg_wards_placed: f(self.avg_wards_placed, other.avg_wards_placed),
            avg_solo_kills: f(self.avg_solo_kills, other.avg_solo_kills),
            avg_takedowns: f(self.avg_takedowns, other.avg_takedowns),
        }
    }

    /// Apply `f` to every field.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        self.zip_with(self, |value, _| f(value))
    }
}

/// Per-account summary of one freshly collected batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// Number of games in the batch.
    pub games: u64,
    /// Arithmetic means over the batch.
    pub averages: StatLine,
    /// Highest single-game damage to champions in the batch.
    pub damage_record: f64,
    /// Match ids summarized, in the order they were seen.
    pub match_ids: Vec<String>,
}

impl BatchSummary {
    /// A batch with no games.
    pub fn empty() -> Self {
        Self {
            games: 0,
            averages: StatLine::default(),
            damage_record: 0.0,
            match_ids: Vec::new(),
        }
    }

    /// Check if the batch holds no games.
    pub fn is_empty(&self) -> bool {
        self.games == 0
    }
}

/// Running per-account state, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAggregate {
    /// Owning account.
    pub external_id: String,
    /// Games merged so far. Never decreases.
    pub number_of_games: u64,
    /// Averages over every merged game.
    #[serde(flatten)]
    pub averages: StatLine,
    /// Highest single-game damage to champions ever merged. Never decreases.
    pub damage_record: f64,
    /// Most recently merged match ids, newest last.
    #[serde(default)]
    pub recent_matches: VecDeque<String>,
}

impl PersistedAggregate {
    /// Check if `match_id` was already merged into this aggregate.
    pub fn has_merged(&self, match_id: &str) -> bool {
        self.recent_matches.iter().any(|id| id == match_id)
    }

    /// Copy with every numeric output rounded to `places` decimals.
    pub fn rounded(&self, places: i32) -> Self {
        let factor = 10f64.powi(places);
        let round = |value: f64| (value * factor).round() / factor;
        Self {
            averages: self.averages.map(round),
            damage_record: round(self.damage_record),
            ..self.clone()
        }
    }
}
