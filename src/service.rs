//! Refresh orchestration and roster management.
//!
//! [`Ladder`] ties the pieces together: it reads the roster and watermark
//! from the [`Store`], collects new matches through a [`MatchSource`], merges
//! them into each account's aggregate, and serves the leaderboard.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use match_ladder::clock::SystemClock;
//! use match_ladder::config::{LadderConfig, UpstreamConfig};
//! use match_ladder::leaderboard::Metric;
//! use match_ladder::service::Ladder;
//! use match_ladder::store::MemoryStore;
//! use match_ladder::throttle::{ThrottleConfig, Throttler};
//! use match_ladder::upstream::ThrottledClient;
//!
//! let clock = Arc::new(SystemClock);
//! let throttler = Arc::new(Throttler::new(ThrottleConfig::default(), clock.clone()));
//! let source = ThrottledClient::new(UpstreamConfig::from_env()?.client(), throttler);
//! let ladder = Ladder::new(source, MemoryStore::new(), clock, LadderConfig::default());
//!
//! ladder.add_account("Faker", "KR1").await?;
//! ladder.refresh_roster(None, None).await?;
//! for row in ladder.view_leaderboard(Metric::Kda).await? {
//!     println!("{}. {}#{} {:.2}", row.rank, row.display_name, row.tag_line, row.kda);
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::Result;
use crate::clock::Clock;
use crate::collector::{AccountFailure, FailureStage, MatchCollector};
use crate::config::LadderConfig;
use crate::error::LadderError;
use crate::leaderboard::{self, LeaderboardEntry, Metric};
use crate::stats::{self, PERSISTED_PRECISION};
use crate::store::Store;
use crate::types::{Account, MatchRecord, PersistedAggregate};
use crate::upstream::{MatchIdsRequest, MatchSource};

/// Why a refresh did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The last roster refresh was too recent.
    Cooldown {
        /// Time left until a cycle may run.
        remaining: Duration,
    },
    /// Another cycle holds the lock.
    InFlight,
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// When the cycle started, per the ladder's clock.
    pub started_at: OffsetDateTime,
    /// Accounts whose aggregate was written.
    pub updated_count: usize,
    /// Distinct matches collected.
    pub matches: usize,
    /// Account-local failures. Non-empty means the cycle was partial.
    pub failed: Vec<AccountFailure>,
}

impl CycleReport {
    fn new(started_at: OffsetDateTime) -> Self {
        Self {
            started_at,
            updated_count: 0,
            matches: 0,
            failed: Vec::new(),
        }
    }

    /// Check if any account failed.
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Distinct ids of the accounts that failed.
    pub fn failed_account_ids(&self) -> BTreeSet<String> {
        self.failed.iter().map(|f| f.external_id.clone()).collect()
    }
}

/// Outcome of [`Ladder::refresh_roster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nothing was done.
    Skipped(SkipReason),
    /// The cycle ran, possibly with account-local failures.
    Completed(CycleReport),
}

impl RefreshOutcome {
    /// The report, if the cycle ran.
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            RefreshOutcome::Completed(report) => Some(report),
            RefreshOutcome::Skipped(_) => None,
        }
    }
}

/// Whether a cycle may move the data watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatermarkRule {
    /// Advance to the cycle start if no account failed.
    AdvanceOnSuccess,
    /// Leave it alone: the cycle did not cover every roster member from
    /// the stored watermark onwards.
    Hold,
}

/// The ladder service.
///
/// At most one cycle runs at a time. A roster refresh requested while
/// another cycle holds the lock is skipped; the refresh that follows an
/// [`add_account`](Ladder::add_account) waits for it instead.
pub struct Ladder<S, St> {
    source: S,
    store: St,
    clock: Arc<dyn Clock>,
    config: LadderConfig,
    cycle: Mutex<()>,
}

impl<S: MatchSource, St: Store> Ladder<S, St> {
    /// Create a new ladder.
    pub fn new(source: S, store: St, clock: Arc<dyn Clock>, config: LadderConfig) -> Self {
        Self {
            source,
            store,
            clock,
            config,
            cycle: Mutex::new(()),
        }
    }

    /// The match source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The store.
    pub fn store(&self) -> &St {
        &self.store
    }

    /// The active configuration.
    pub fn config(&self) -> &LadderConfig {
        &self.config
    }

    /// Run one refresh cycle over the roster.
    ///
    /// `account_ids` narrows the cycle to those roster members; ids not on
    /// the roster are ignored. `since_override` replaces the stored
    /// watermark as the lower bound for this cycle.
    ///
    /// The cooldown runs from the start of the last completed refresh, partial
    /// or not. The watermark only advances after a failure-free cycle over
    /// the whole roster whose bound was no later than the stored one.
    ///
    /// Returns `Skipped` without any upstream call if a cycle is already in
    /// flight or the cooldown has not elapsed. Account-local failures are
    /// reported in the [`CycleReport`]; only a failure to read the roster or
    /// watermark aborts the cycle.
    pub async fn refresh_roster(
        &self,
        account_ids: Option<&BTreeSet<String>>,
        since_override: Option<OffsetDateTime>,
    ) -> Result<RefreshOutcome> {
        let Ok(_guard) = self.cycle.try_lock() else {
            tracing::info!("refresh skipped, cycle already in flight");
            return Ok(RefreshOutcome::Skipped(SkipReason::InFlight));
        };

        let started_at = self.clock.now();
        let last_refresh = self.store.get_last_refresh().await?;
        if let Some(remaining) = last_refresh.and_then(|at| self.cooldown_remaining(at, started_at)) {
            tracing::info!(remaining_ms = remaining.as_millis() as u64, "refresh skipped, cooldown active");
            return Ok(RefreshOutcome::Skipped(SkipReason::Cooldown { remaining }));
        }

        let roster: BTreeSet<String> = self
            .store
            .list_accounts()
            .await?
            .into_iter()
            .map(|account| account.external_id)
            .collect();
        let roster_size = roster.len();
        let ids: BTreeSet<String> = match account_ids {
            Some(requested) => {
                for unknown in requested.difference(&roster) {
                    tracing::warn!(external_id = %unknown, "ignoring account not on the roster");
                }
                requested.intersection(&roster).cloned().collect()
            }
            None => roster,
        };

        let watermark = self.store.get_watermark().await?;
        let bound_covers_watermark = match (since_override, watermark) {
            (None, _) => true,
            (Some(since), Some(watermark)) => since <= watermark,
            (Some(_), None) => false,
        };
        let rule = if ids.len() == roster_size && bound_covers_watermark {
            WatermarkRule::AdvanceOnSuccess
        } else {
            WatermarkRule::Hold
        };

        let since = since_override.or(watermark);
        let report = self.run_cycle(&ids, since, started_at, rule).await?;
        self.store.put_last_refresh(started_at).await?;
        Ok(RefreshOutcome::Completed(report))
    }

    /// Resolve an account upstream, add it to the roster, and build its first aggregate.
    ///
    /// Duplicates are detected case-insensitively on name and tag, and again
    /// on the resolved external id. The follow-up refresh covers only the new
    /// account and bypasses the cooldown; its failures are logged and the
    /// account stays on the roster for the next cycle to pick up.
    pub async fn add_account(&self, display_name: &str, tag_line: &str) -> Result<Account> {
        let display_name = display_name.trim();
        let tag_line = tag_line.trim();

        let roster = self.store.list_accounts().await?;
        if let Some(existing) = roster
            .iter()
            .find(|account| account.matches_riot_id(display_name, tag_line))
        {
            return Err(already_exists(existing));
        }

        let account = self
            .source
            .resolve_account(display_name, tag_line)
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    LadderError::AccountNotFound {
                        display_name: display_name.to_string(),
                        tag_line: tag_line.to_string(),
                    }
                } else {
                    err.into()
                }
            })?;

        if let Some(existing) = self.store.get_account(&account.external_id).await? {
            return Err(already_exists(&existing));
        }

        self.store.put_account(&account).await?;
        tracing::info!(external_id = %account.external_id, riot_id = %account.riot_id(), "account added");

        let _guard = self.cycle.lock().await;
        let ids = BTreeSet::from([account.external_id.clone()]);
        let report = self.run_cycle(&ids, None, self.clock.now(), WatermarkRule::Hold).await?;
        if report.is_partial() {
            tracing::warn!(
                external_id = %account.external_id,
                failures = report.failed.len(),
                "initial refresh for new account was partial"
            );
        }

        Ok(account)
    }

    /// Remove an account and its aggregate.
    pub async fn remove_account(&self, external_id: &str) -> Result<Account> {
        let account = self
            .store
            .get_account(external_id)
            .await?
            .ok_or_else(|| LadderError::UnknownAccount(external_id.to_string()))?;

        self.store.delete_account(external_id).await?;
        self.store.delete_aggregate(external_id).await?;
        tracing::info!(external_id, riot_id = %account.riot_id(), "account removed");
        Ok(account)
    }

    /// The leaderboard ordered by `metric`.
    pub async fn view_leaderboard(&self, metric: Metric) -> Result<Vec<LeaderboardEntry>> {
        let aggregates = self.store.scan_all_aggregates().await?;
        let accounts = self.store.list_accounts().await?;
        Ok(leaderboard::rank(&aggregates, &accounts, metric))
    }

    /// Every roster account, ordered case-insensitively by `displayName#tagLine`.
    pub async fn roster(&self) -> Result<Vec<Account>> {
        let mut accounts = self.store.list_accounts().await?;
        accounts.sort_by_cached_key(|account| account.riot_id().to_lowercase());
        Ok(accounts)
    }

    /// Whether a merge is in progress; aggregates may be inconsistent while true.
    pub async fn is_processing(&self) -> Result<bool> {
        Ok(self.store.get_processing_flag().await?)
    }

    fn cooldown_remaining(&self, last_refresh: OffsetDateTime, now: OffsetDateTime) -> Option<Duration> {
        let elapsed = Duration::try_from(now - last_refresh).unwrap_or_default();
        self.config
            .cooldown
            .checked_sub(elapsed)
            .filter(|remaining| !remaining.is_zero())
    }

    /// Collect, merge, and persist for `ids`. Caller holds the cycle lock.
    async fn run_cycle(
        &self,
        ids: &BTreeSet<String>,
        since: Option<OffsetDateTime>,
        started_at: OffsetDateTime,
        rule: WatermarkRule,
    ) -> Result<CycleReport> {
        tracing::info!(accounts = ids.len(), ?since, ?rule, "refresh cycle started");
        let mut report = CycleReport::new(started_at);

        let mut existing: HashMap<String, Option<PersistedAggregate>> = HashMap::new();
        for external_id in ids {
            match self.store.get_aggregate(external_id).await {
                Ok(aggregate) => {
                    existing.insert(external_id.clone(), aggregate);
                }
                Err(err) => {
                    tracing::warn!(external_id = %external_id, error = %err, "loading aggregate failed");
                    report
                        .failed
                        .push(AccountFailure::new(external_id.as_str(), FailureStage::LoadAggregate, err));
                }
            }
        }
        let loaded: BTreeSet<String> = existing.keys().cloned().collect();

        let steady = MatchIdsRequest { since, count: None };
        let initial = MatchIdsRequest {
            since: None,
            count: self.config.initial_history_limit,
        };
        let collector = MatchCollector::new(&self.source, self.config.collector_config());
        let collected = collector
            .collect_with(&loaded, |external_id| match existing.get(external_id) {
                Some(Some(_)) => steady,
                _ => initial,
            })
            .await;
        report.matches = collected.matches.len();
        report.failed.extend(collected.failures);

        self.store.set_processing_flag(true).await?;
        self.merge_batches(&collected.matches, existing, &mut report).await;
        if let Err(err) = self.store.set_processing_flag(false).await {
            tracing::warn!(error = %err, "clearing processing flag failed");
            return Err(err.into());
        }

        if rule == WatermarkRule::AdvanceOnSuccess && !report.is_partial() {
            self.store.put_watermark(started_at).await?;
        }

        tracing::info!(
            updated = report.updated_count,
            matches = report.matches,
            failed = report.failed.len(),
            "refresh cycle finished"
        );
        Ok(report)
    }

    async fn merge_batches(
        &self,
        matches: &BTreeMap<String, MatchRecord>,
        existing: HashMap<String, Option<PersistedAggregate>>,
        report: &mut CycleReport,
    ) {
        let mut grouped = stats::group_by_account(matches);

        for (external_id, current) in existing {
            let games = grouped.remove(&external_id).unwrap_or_default();
            let fresh = stats::skip_merged(games, current.as_ref());
            if fresh.is_empty() {
                tracing::debug!(external_id = %external_id, "no new games");
                continue;
            }

            let batch = stats::summarize(&fresh);
            let merged = stats::merge(current.as_ref(), &external_id, &batch, self.config.ledger_capacity)
                .rounded(PERSISTED_PRECISION);

            match self.store.put_aggregate(&merged).await {
                Ok(()) => {
                    tracing::debug!(external_id = %external_id, games = batch.games, "aggregate updated");
                    report.updated_count += 1;
                }
                Err(err) => {
                    tracing::warn!(external_id = %external_id, error = %err, "storing aggregate failed");
                    report
                        .failed
                        .push(AccountFailure::new(external_id, FailureStage::StoreAggregate, err));
                }
            }
        }
    }
}

fn already_exists(existing: &Account) -> LadderError {
    LadderError::AlreadyExists {
        display_name: existing.display_name.clone(),
        tag_line: existing.tag_line.clone(),
    }
}

impl<S, St> std::fmt::Debug for Ladder<S, St> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ladder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
