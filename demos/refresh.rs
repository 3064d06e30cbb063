//! Example: Build a small ladder and print it.
//!
//! Adds the accounts given on the command line (as `Name#TAG`), runs one
//! refresh cycle and prints the leaderboard ordered by KDA.
//!
//! Requires `RIOT_API_KEY` (a `.env` file works too).
//!
//! Run with: cargo run --example refresh -- "Doublelift#NA1" "Sneaky#NA69"

use std::sync::Arc;

use match_ladder::clock::SystemClock;
use match_ladder::config::{LadderConfig, UpstreamConfig};
use match_ladder::leaderboard::Metric;
use match_ladder::service::{Ladder, RefreshOutcome};
use match_ladder::store::MemoryStore;
use match_ladder::throttle::{ThrottleConfig, Throttler};
use match_ladder::upstream::ThrottledClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let _ = dotenv::dotenv();

    let upstream = UpstreamConfig::from_env()?;
    let config = LadderConfig::from_env()?;

    let clock = Arc::new(SystemClock);
    let throttler = Arc::new(Throttler::new(ThrottleConfig::default(), clock.clone()));
    let source = ThrottledClient::new(upstream.client(), throttler).with_max_attempts(config.max_attempts);
    let ladder = Ladder::new(source, MemoryStore::new(), clock, config);

    for riot_id in std::env::args().skip(1) {
        let Some((name, tag)) = riot_id.split_once('#') else {
            eprintln!("skipping '{riot_id}': expected Name#TAG");
            continue;
        };
        match ladder.add_account(name, tag).await {
            Ok(account) => println!("Added {} ({})", account, account.external_id),
            Err(err) => eprintln!("Could not add {riot_id}: {err}"),
        }
    }

    match ladder.refresh_roster(None, None).await? {
        RefreshOutcome::Completed(report) => {
            println!("Refreshed {} accounts from {} matches", report.updated_count, report.matches);
            for failure in &report.failed {
                eprintln!("  {} failed at {}: {}", failure.external_id, failure.stage, failure.reason);
            }
        }
        RefreshOutcome::Skipped(reason) => println!("Refresh skipped: {reason:?}"),
    }

    println!();
    println!("{:<4} {:<24} {:>6} {:>7} {:>10} {:>9}", "#", "Player", "KDA", "CS/min", "Dmg record", "Avg gold");
    for row in ladder.view_leaderboard(Metric::Kda).await? {
        println!(
            "{:<4} {:<24} {:>6.2} {:>7.2} {:>10.0} {:>9.0}",
            row.rank,
            format!("{}#{}", row.display_name, row.tag_line),
            row.kda,
            row.cs_per_min,
            row.damage_record,
            row.avg_gold
        );
    }

    Ok(())
}
