//! Match collection across a roster.
//!
//! Given the tracked account ids, the collector lists each account's new
//! match ids, fetches every distinct match exactly once, and narrows each
//! match to the tracked participants.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::collections::BTreeSet;
//! use match_ladder::collector::{CollectorConfig, MatchCollector};
//!
//! let roster: BTreeSet<String> = ["puuid-a".to_string(), "puuid-b".to_string()].into();
//! let collector = MatchCollector::new(&source, CollectorConfig::default());
//! let outcome = collector.collect(&roster, Some(watermark)).await;
//! for failure in &outcome.failures {
//!     eprintln!("{} failed: {}", failure.external_id, failure.reason);
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use futures_util::stream::{self, StreamExt};
use time::OffsetDateTime;

use crate::types::MatchRecord;
use crate::upstream::{MatchIdsRequest, MatchSource};

/// What to do with a match that has no tracked participants left after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyMatchPolicy {
    /// Leave it out of the result.
    #[default]
    Drop,
    /// Keep it as a record with no participants.
    Keep,
}

/// Collector settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Maximum upstream calls in flight per stage.
    pub concurrency: usize,
    /// Handling of matches with no tracked participants.
    pub empty_match_policy: EmptyMatchPolicy,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            empty_match_policy: EmptyMatchPolicy::Drop,
        }
    }
}

/// Where in a cycle an account failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// Listing the account's match ids.
    ListMatches,
    /// Fetching a match the account played in.
    FetchMatch,
    /// Reading the account's aggregate.
    LoadAggregate,
    /// Writing the account's aggregate.
    StoreAggregate,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureStage::ListMatches => "list_matches",
            FailureStage::FetchMatch => "fetch_match",
            FailureStage::LoadAggregate => "load_aggregate",
            FailureStage::StoreAggregate => "store_aggregate",
        };
        write!(f, "{}", s)
    }
}

/// One account-local failure inside a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFailure {
    /// The affected account.
    pub external_id: String,
    /// Where it failed.
    pub stage: FailureStage,
    /// Error text.
    pub reason: String,
}

impl AccountFailure {
    /// Create a new failure entry.
    pub fn new(external_id: impl Into<String>, stage: FailureStage, reason: impl ToString) -> Self {
        Self {
            external_id: external_id.into(),
            stage,
            reason: reason.to_string(),
        }
    }
}

/// Result of one collection pass.
#[derive(Debug, Clone, Default)]
pub struct CollectOutcome {
    /// Distinct matches, filtered to tracked participants.
    pub matches: BTreeMap<String, MatchRecord>,
    /// Accounts whose listing or match fetches failed.
    pub failures: Vec<AccountFailure>,
    /// Number of match fetches issued.
    pub fetched: usize,
}

impl CollectOutcome {
    /// Check if nothing new was found.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Ids of accounts with at least one failure.
    pub fn failed_accounts(&self) -> BTreeSet<String> {
        self.failures.iter().map(|f| f.external_id.clone()).collect()
    }
}

/// Collects new matches for a set of accounts from a [`MatchSource`].
#[derive(Debug)]
pub struct MatchCollector<'a, S> {
    source: &'a S,
    config: CollectorConfig,
}

impl<'a, S: MatchSource> MatchCollector<'a, S> {
    /// Create a collector over `source`.
    pub fn new(source: &'a S, config: CollectorConfig) -> Self {
        Self { source, config }
    }

    /// Collect matches since `since` (`None` = full history) for every account.
    pub async fn collect(
        &self,
        account_ids: &BTreeSet<String>,
        since: Option<OffsetDateTime>,
    ) -> CollectOutcome {
        let request = MatchIdsRequest { since, count: None };
        self.collect_with(account_ids, |_| request).await
    }

    /// Collect with a per-account listing request.
    ///
    /// Lets first-time accounts pull their history while the rest of the
    /// roster is bounded by the watermark.
    pub async fn collect_with<F>(&self, account_ids: &BTreeSet<String>, request_for: F) -> CollectOutcome
    where
        F: Fn(&str) -> MatchIdsRequest,
    {
        let concurrency = self.config.concurrency.max(1);
        let mut outcome = CollectOutcome::default();

        // Stream owned ids: futures borrowing the items would not be `Send`.
        let source = self.source;
        let listings: Vec<_> = stream::iter(account_ids.iter().cloned())
            .map(|external_id| {
                let request = request_for(external_id.as_str());
                async move {
                    let result = source.list_match_ids(&external_id, &request).await;
                    (external_id, result)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        // match id -> accounts that listed it
        let mut referenced: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (external_id, result) in listings {
            match result {
                Ok(match_ids) => {
                    tracing::debug!(external_id = %external_id, count = match_ids.len(), "listed match ids");
                    for match_id in match_ids {
                        referenced.entry(match_id).or_default().push(external_id.clone());
                    }
                }
                Err(err) => {
                    tracing::warn!(external_id = %external_id, error = %err, "listing match ids failed");
                    outcome
                        .failures
                        .push(AccountFailure::new(external_id, FailureStage::ListMatches, err));
                }
            }
        }

        let fetches: Vec<_> = stream::iter(referenced.keys().cloned())
            .map(|match_id| async move {
                let result = source.fetch_match(&match_id).await;
                (match_id, result)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        outcome.fetched = fetches.len();

        for (match_id, result) in fetches {
            match result {
                Ok(mut record) => {
                    record.retain_participants(|id| account_ids.contains(id));
                    if record.participants.is_empty()
                        && self.config.empty_match_policy == EmptyMatchPolicy::Drop
                    {
                        tracing::debug!(match_id = %match_id, "dropping match with no tracked participants");
                        continue;
                    }
                    outcome.matches.insert(match_id, record);
                }
                Err(err) => {
                    tracing::warn!(match_id = %match_id, error = %err, "fetching match failed");
                    for external_id in referenced.get(&match_id).into_iter().flatten() {
                        outcome.failures.push(AccountFailure::new(
                            external_id.as_str(),
                            FailureStage::FetchMatch,
                            format!("{match_id}: {err}"),
                        ));
                    }
                }
            }
        }

        tracing::info!(
            accounts = account_ids.len(),
            fetched = outcome.fetched,
            matches = outcome.matches.len(),
            failures = outcome.failures.len(),
            "match collection finished"
        );
        outcome
    }
}
