//! Leaderboard view over persisted aggregates.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LadderError;
use crate::types::{Account, PersistedAggregate};

/// Column a leaderboard can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// Average kill/death/assist ratio.
    #[default]
    Kda,
    /// Average minions killed per minute played.
    CsPerMin,
    /// Highest damage to champions in a single game.
    DamageRecord,
    /// Average damage to champions.
    AvgDamage,
    /// Average damage taken.
    AvgDamageTaken,
    /// Average gold earned.
    AvgGold,
    /// Average seconds spent dead.
    AvgTimeDead,
    /// Average wards placed.
    AvgWardsPlaced,
    /// Average solo kills.
    AvgSoloKills,
    /// Average takedowns.
    AvgTakedowns,
    /// Games merged into the aggregate.
    NumberOfGames,
}

impl Metric {
    /// Every metric, in display order.
    pub const ALL: [Metric; 11] = [
        Metric::Kda,
        Metric::CsPerMin,
        Metric::DamageRecord,
        Metric::AvgDamage,
        Metric::AvgDamageTaken,
        Metric::AvgGold,
        Metric::AvgTimeDead,
        Metric::AvgWardsPlaced,
        Metric::AvgSoloKills,
        Metric::AvgTakedowns,
        Metric::NumberOfGames,
    ];

    /// The wire name, as used in stored aggregates.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Kda => "kda",
            Metric::CsPerMin => "csPerMin",
            Metric::DamageRecord => "damageRecord",
            Metric::AvgDamage => "avgDamage",
            Metric::AvgDamageTaken => "avgDamageTaken",
            Metric::AvgGold => "avgGold",
            Metric::AvgTimeDead => "avgTimeDead",
            Metric::AvgWardsPlaced => "avgWardsPlaced",
            Metric::AvgSoloKills => "avgSoloKills",
            Metric::AvgTakedowns => "avgTakedowns",
            Metric::NumberOfGames => "numberOfGames",
        }
    }

    /// Read this metric from an aggregate.
    pub fn value(&self, aggregate: &PersistedAggregate) -> f64 {
        let averages = &aggregate.averages;
        match self {
            Metric::Kda => averages.kda,
            Metric::CsPerMin => averages.cs_per_min,
            Metric::DamageRecord => aggregate.damage_record,
            Metric::AvgDamage => averages.avg_damage,
            Metric::AvgDamageTaken => averages.avg_damage_taken,
            Metric::AvgGold => averages.avg_gold,
            Metric::AvgTimeDead => averages.avg_time_dead,
            Metric::AvgWardsPlaced => averages.avg_wards_placed,
            Metric::AvgSoloKills => averages.avg_solo_kills,
            Metric::AvgTakedowns => averages.avg_takedowns,
            Metric::NumberOfGames => aggregate.number_of_games as f64,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Metric {
    type Err = LadderError;

    /// Parse a wire name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Metric::ALL
            .into_iter()
            .find(|metric| metric.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LadderError::UnknownMetric(s.to_string()))
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    /// Account display name.
    pub display_name: String,
    /// Account tag line.
    pub tag_line: String,
    /// Stable upstream account id.
    pub external_id: String,
    /// See [`Metric::NumberOfGames`].
    pub number_of_games: u64,
    /// See [`Metric::Kda`].
    pub kda: f64,
    /// See [`Metric::CsPerMin`].
    pub cs_per_min: f64,
    /// See [`Metric::DamageRecord`].
    pub damage_record: f64,
    /// See [`Metric::AvgDamage`].
    pub avg_damage: f64,
    /// See [`Metric::AvgDamageTaken`].
    pub avg_damage_taken: f64,
    /// See [`Metric::AvgGold`].
    pub avg_gold: f64,
    /// See [`Metric::AvgTimeDead`].
    pub avg_time_dead: f64,
    /// See [`Metric::AvgWardsPlaced`].
    pub avg_wards_placed: f64,
    /// See [`Metric::AvgSoloKills`].
    pub avg_solo_kills: f64,
    /// See [`Metric::AvgTakedowns`].
    pub avg_takedowns: f64,
}

impl LeaderboardEntry {
    fn new(rank: usize, account: &Account, aggregate: &PersistedAggregate) -> Self {
        let averages = &aggregate.averages;
        Self {
            rank,
            display_name: account.display_name.clone(),
            tag_line: account.tag_line.clone(),
            external_id: account.external_id.clone(),
            number_of_games: aggregate.number_of_games,
            kda: averages.kda,
            cs_per_min: averages.cs_per_min,
            damage_record: aggregate.damage_record,
            avg_damage: averages.avg_damage,
            avg_damage_taken: averages.avg_damage_taken,
            avg_gold: averages.avg_gold,
            avg_time_dead: averages.avg_time_dead,
            avg_wards_placed: averages.avg_wards_placed,
            avg_solo_kills: averages.avg_solo_kills,
            avg_takedowns: averages.avg_takedowns,
        }
    }
}

/// Order `aggregates` by `metric`, highest first, joined with `accounts`.
///
/// Aggregates whose account is not in `accounts` are left out. Ties are
/// broken by `displayName#tagLine`.
pub fn rank(aggregates: &[PersistedAggregate], accounts: &[Account], metric: Metric) -> Vec<LeaderboardEntry> {
    let by_id: HashMap<&str, &Account> = accounts
        .iter()
        .map(|account| (account.external_id.as_str(), account))
        .collect();

    let mut rows: Vec<(&Account, &PersistedAggregate)> = aggregates
        .iter()
        .filter_map(|aggregate| {
            by_id
                .get(aggregate.external_id.as_str())
                .map(|account| (*account, aggregate))
        })
        .collect();

    rows.sort_by(|(a_account, a), (b_account, b)| {
        metric
            .value(b)
            .total_cmp(&metric.value(a))
            .then_with(|| {
                a_account
                    .riot_id()
                    .to_lowercase()
                    .cmp(&b_account.riot_id().to_lowercase())
            })
    });

    rows.into_iter()
        .enumerate()
        .map(|(i, (account, aggregate))| LeaderboardEntry::new(i + 1, account, aggregate))
        .collect()
}
