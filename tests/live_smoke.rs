use std::sync::Arc;

use match_ladder::clock::SystemClock;
use match_ladder::config::UpstreamConfig;
use match_ladder::throttle::{ThrottleConfig, Throttler};
use match_ladder::upstream::{MatchIdsRequest, MatchSource, ThrottledClient};

fn live_tests_enabled() -> bool {
    std::env::var("LADDER_LIVE_TESTS").ok().as_deref() == Some("1")
}

#[tokio::test]
#[ignore]
async fn live_upstream_smoke() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    if !live_tests_enabled() {
        return Ok(());
    }

    let config = match UpstreamConfig::try_from_env() {
        Some(config) => config,
        None => return Ok(()),
    };
    let display_name = std::env::var("LADDER_LIVE_NAME").unwrap_or_else(|_| "Doublelift".to_string());
    let tag_line = std::env::var("LADDER_LIVE_TAG").unwrap_or_else(|_| "NA1".to_string());

    let throttler = Arc::new(Throttler::new(ThrottleConfig::default(), Arc::new(SystemClock)));
    let client = ThrottledClient::new(config.client(), throttler);

    let account = client.resolve_account(&display_name, &tag_line).await?;
    assert!(!account.external_id.is_empty());

    let ids = client
        .list_match_ids(&account.external_id, &MatchIdsRequest::default().with_count(1))
        .await?;
    if let Some(match_id) = ids.first() {
        let record = client.fetch_match(match_id).await?;
        assert!(
            record
                .participants
                .iter()
                .any(|p| p.external_id == account.external_id)
        );
    }

    Ok(())
}
