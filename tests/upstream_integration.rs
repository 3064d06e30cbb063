use std::sync::Arc;
use std::time::Duration;

use time::macros::datetime;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use match_ladder::auth::ApiKey;
use match_ladder::clock::ManualClock;
use match_ladder::config::LadderConfig;
use match_ladder::leaderboard::Metric;
use match_ladder::service::Ladder;
use match_ladder::store::{MemoryStore, Store};
use match_ladder::types::Account;
use match_ladder::throttle::{ThrottleConfig, Throttler};
use match_ladder::upstream::{MatchIdsRequest, MatchSource, RiotClient, ThrottledClient};
use match_ladder::UpstreamError;

const KEY: &str = "RGAPI-test-key";

fn build_client(server: &MockServer) -> RiotClient {
    RiotClient::builder()
        .base_url(server.uri())
        .api_key(ApiKey::new(KEY))
        .build()
}

fn match_body(match_id: &str, participants: &[(&str, f64)]) -> serde_json::Value {
    let participants: Vec<_> = participants
        .iter()
        .map(|(puuid, damage)| {
            serde_json::json!({
                "puuid": puuid,
                "timePlayed": 1500,
                "totalMinionsKilled": 175,
                "totalDamageDealtToChampions": damage,
                "totalDamageTaken": 21000,
                "totalTimeSpentDead": 120,
                "wardsPlaced": 9,
                "goldEarned": 11000,
                "challenges": { "kda": 3.5, "soloKills": 1, "takedowns": 10 }
            })
        })
        .collect();
    serde_json::json!({
        "metadata": { "matchId": match_id, "participants": [] },
        "info": { "gameDuration": 1500, "participants": participants }
    })
}

#[tokio::test]
async fn test_resolve_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/riot/account/v1/accounts/by-riot-id/Foo/NA1"))
        .and(header("X-Riot-Token", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "puuid": "puuid-foo",
            "gameName": "Foo",
            "tagLine": "NA1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let account = client.resolve_account("Foo", "NA1").await.unwrap();

    assert_eq!(account.external_id, "puuid-foo");
    assert_eq!(account.riot_id(), "Foo#NA1");
}

#[tokio::test]
async fn test_resolve_account_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/riot/account/v1/accounts/by-riot-id/Nobody/NA1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "status": { "message": "Data not found", "status_code": 404 }
        })))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let err = client.resolve_account("Nobody", "NA1").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_list_match_ids_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/by-puuid/puuid-foo/ids"))
        .and(query_param("startTime", "1717200000"))
        .and(query_param("count", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            "NA1_3", "NA1_2", "NA1_1"
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let request = MatchIdsRequest::since(datetime!(2024-06-01 0:00 UTC)).with_count(5);
    let ids = client.list_match_ids("puuid-foo", &request).await.unwrap();

    assert_eq!(ids, ["NA1_3", "NA1_2", "NA1_1"]);
}

#[tokio::test]
async fn test_fetch_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(match_body("NA1_1", &[("puuid-foo", 24000.0), ("stranger", 9000.0)])),
        )
        .mount(&server)
        .await;

    let client = build_client(&server);
    let record = client.fetch_match("NA1_1").await.unwrap();

    assert_eq!(record.match_id, "NA1_1");
    assert_eq!(record.participants.len(), 2);
    assert_eq!(record.participants[0].damage_to_champions, 24000.0);
    assert_eq!(record.participants[0].cs_per_min(), 7.0);
}

#[tokio::test]
async fn test_rate_limited_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
        .mount(&server)
        .await;

    let client = build_client(&server);
    let err = client.fetch_match("NA1_1").await.unwrap_err();

    assert!(matches!(
        err,
        UpstreamError::RateLimited {
            retry_after_ms: Some(2000)
        }
    ));
}

#[tokio::test]
async fn test_server_error_and_bad_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_500"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = build_client(&server);

    let err = client.fetch_match("NA1_500").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Status { status: 503, .. }));
    assert!(err.is_transient());

    let err = client.fetch_match("NA1_garbled").await.unwrap_err();
    assert!(matches!(err, UpstreamError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_throttled_client_retries_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(match_body("NA1_1", &[("puuid-foo", 100.0)])))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(datetime!(2024-06-01 0:00 UTC)));
    let throttler = Arc::new(Throttler::new(ThrottleConfig::default(), clock.clone()));
    let client = ThrottledClient::new(build_client(&server), throttler.clone());

    let record = client.fetch_match("NA1_1").await.unwrap();

    assert_eq!(record.participants.len(), 1);
    assert_eq!(clock.total_slept(), Duration::from_secs(3));
    assert_eq!(throttler.in_window().await.0, 2);
}

#[tokio::test]
async fn test_ladder_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/riot/account/v1/accounts/by-riot-id/Foo/NA1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "puuid": "puuid-foo",
            "gameName": "Foo",
            "tagLine": "NA1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/by-puuid/puuid-foo/ids"))
        .and(query_param("count", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["NA1_2", "NA1_1"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(match_body("NA1_1", &[("puuid-foo", 10000.0), ("x", 1.0)])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(match_body("NA1_2", &[("puuid-foo", 30000.0)])))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(datetime!(2024-06-01 0:00 UTC)));
    let throttler = Arc::new(Throttler::new(ThrottleConfig::default(), clock.clone()));
    let source = ThrottledClient::new(build_client(&server), throttler);
    let ladder = Ladder::new(source, MemoryStore::new(), clock, LadderConfig::default());

    let account = ladder.add_account("Foo", "NA1").await.unwrap();
    assert_eq!(account.external_id, "puuid-foo");

    let rows = ladder.view_leaderboard(Metric::AvgDamage).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].number_of_games, 2);
    assert_eq!(rows[0].avg_damage, 20000.0);
    assert_eq!(rows[0].damage_record, 30000.0);
    assert_eq!(rows[0].cs_per_min, 7.0);
    assert!(!ladder.is_processing().await.unwrap());
}

#[tokio::test]
async fn test_cycles_run_on_spawned_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/riot/account/v1/accounts/by-riot-id/Foo/NA1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "puuid": "puuid-foo",
            "gameName": "Foo",
            "tagLine": "NA1"
        })))
        .mount(&server)
        .await;
    for puuid in ["puuid-foo", "puuid-bar"] {
        Mock::given(method("GET"))
            .and(path(format!("/lol/match/v5/matches/by-puuid/{puuid}/ids")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["NA1_1"])))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/lol/match/v5/matches/NA1_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(match_body("NA1_1", &[("puuid-foo", 10000.0), ("puuid-bar", 20000.0)])),
        )
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(datetime!(2024-06-01 0:00 UTC)));
    let throttler = Arc::new(Throttler::new(ThrottleConfig::default(), clock.clone()));
    let source = ThrottledClient::new(build_client(&server), throttler);
    let ladder = Arc::new(Ladder::new(source, MemoryStore::new(), clock, LadderConfig::default()));
    ladder
        .store()
        .put_account(&Account::new("Bar", "NA1", "puuid-bar"))
        .await
        .unwrap();

    let refresh = tokio::spawn({
        let ladder = ladder.clone();
        async move { ladder.refresh_roster(None, None).await }
    });
    let outcome = refresh.await.unwrap().unwrap();
    assert_eq!(outcome.report().unwrap().updated_count, 1);

    let add = tokio::spawn({
        let ladder = ladder.clone();
        async move { ladder.add_account("Foo", "NA1").await }
    });
    assert_eq!(add.await.unwrap().unwrap().external_id, "puuid-foo");

    let rows = ladder.view_leaderboard(Metric::AvgDamage).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].external_id, "puuid-bar");
}
