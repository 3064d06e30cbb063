//! Wire types for the upstream account and match endpoints.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{MatchRecord, ParticipantStat};

/// Parameters for listing an account's match ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchIdsRequest {
    /// Only matches that started at or after this time. `None` = no lower bound.
    pub since: Option<OffsetDateTime>,
    /// Maximum number of ids to return. `None` = upstream default.
    pub count: Option<u32>,
}

impl MatchIdsRequest {
    /// Matches since `since`.
    pub fn since(since: OffsetDateTime) -> Self {
        Self {
            since: Some(since),
            count: None,
        }
    }

    /// Set the maximum number of ids.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub(crate) fn query(&self) -> MatchIdsQuery {
        MatchIdsQuery {
            start_time: self.since.map(OffsetDateTime::unix_timestamp),
            count: self.count,
        }
    }
}

/// Query string form of [`MatchIdsRequest`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MatchIdsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u32>,
}

/// Account lookup response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    /// Stable account id.
    pub puuid: String,
    /// Canonical display name, if the account has one.
    #[serde(default)]
    pub game_name: Option<String>,
    /// Canonical tag line, if the account has one.
    #[serde(default)]
    pub tag_line: Option<String>,
}

/// Match detail response.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchDto {
    /// Match metadata.
    pub metadata: MatchMetadataDto,
    /// Match body.
    pub info: MatchInfoDto,
}

/// Match metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadataDto {
    /// Match id.
    pub match_id: String,
}

/// Match body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfoDto {
    /// Every participant in the match.
    #[serde(default)]
    pub participants: Vec<ParticipantDto>,
}

/// One participant's end-of-game numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    /// Participant's account id.
    pub puuid: String,
    /// Seconds the participant was in the game.
    #[serde(default)]
    pub time_played: f64,
    /// Lane minions killed.
    #[serde(default)]
    pub total_minions_killed: f64,
    /// Damage dealt to enemy champions.
    #[serde(default)]
    pub total_damage_dealt_to_champions: f64,
    /// Damage taken from all sources.
    #[serde(default)]
    pub total_damage_taken: f64,
    /// Seconds spent dead.
    #[serde(default)]
    pub total_time_spent_dead: f64,
    /// Wards placed.
    #[serde(default)]
    pub wards_placed: f64,
    /// Gold earned over the game.
    #[serde(default)]
    pub gold_earned: f64,
    /// Derived per-game figures.
    #[serde(default)]
    pub challenges: ChallengesDto,
}

/// Derived per-game figures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengesDto {
    /// `(kills + assists) / deaths`, as computed upstream.
    #[serde(default)]
    pub kda: f64,
    /// Kills with no assisting teammate.
    #[serde(default)]
    pub solo_kills: f64,
    /// Kills plus assists.
    #[serde(default)]
    pub takedowns: f64,
}

impl From<ParticipantDto> for ParticipantStat {
    fn from(dto: ParticipantDto) -> Self {
        Self {
            external_id: dto.puuid,
            damage_to_champions: dto.total_damage_dealt_to_champions,
            damage_taken: dto.total_damage_taken,
            time_dead: dto.total_time_spent_dead,
            wards_placed: dto.wards_placed,
            gold_earned: dto.gold_earned,
            kda: dto.challenges.kda,
            solo_kills: dto.challenges.solo_kills,
            takedowns: dto.challenges.takedowns,
            minions_killed: dto.total_minions_killed,
            time_played: dto.time_played,
        }
    }
}

impl From<MatchDto> for MatchRecord {
    fn from(dto: MatchDto) -> Self {
        Self {
            match_id: dto.metadata.match_id,
            participants: dto.info.participants.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_match_ids_query_string() {
        let request = MatchIdsRequest::since(datetime!(2024-06-01 0:00 UTC)).with_count(20);
        let qs = serde_urlencoded::to_string(request.query()).unwrap();
        assert_eq!(qs, "startTime=1717200000&count=20");

        let unbounded = serde_urlencoded::to_string(MatchIdsRequest::default().query()).unwrap();
        assert!(unbounded.is_empty());
    }

    #[test]
    fn test_match_dto_conversion() {
        let json = serde_json::json!({
            "metadata": { "matchId": "NA1_42" },
            "info": {
                "gameDuration": 1800,
                "participants": [{
                    "puuid": "p1",
                    "timePlayed": 1800,
                    "totalMinionsKilled": 210,
                    "totalDamageDealtToChampions": 25000,
                    "totalDamageTaken": 18000,
                    "totalTimeSpentDead": 95,
                    "wardsPlaced": 11,
                    "goldEarned": 12500,
                    "challenges": { "kda": 4.5, "soloKills": 2, "takedowns": 14 }
                }, {
                    "puuid": "p2"
                }]
            }
        });

        let record: MatchRecord = serde_json::from_value::<MatchDto>(json).unwrap().into();
        assert_eq!(record.match_id, "NA1_42");
        assert_eq!(record.participants.len(), 2);
        assert_eq!(record.participants[0].kda, 4.5);
        assert_eq!(record.participants[0].cs_per_min(), 7.0);
        assert_eq!(record.participants[1].gold_earned, 0.0);
    }
}
