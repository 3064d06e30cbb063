//! Runtime configuration.
//!
//! Both config types have code defaults and an environment loader. The
//! loaders take their variables from a lookup function so they can be
//! exercised without touching the process environment.

use std::time::Duration;

use crate::auth::{API_KEY_VAR, ApiKey};
use crate::collector::{CollectorConfig, EmptyMatchPolicy};
use crate::error::LadderError;
use crate::stats::DEFAULT_LEDGER_CAPACITY;
use crate::upstream::{DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS, RiotClient};

/// Environment variable overriding the upstream base URL.
pub const BASE_URL_VAR: &str = "RIOT_BASE_URL";
/// Environment variable overriding the refresh cooldown, in seconds.
pub const COOLDOWN_VAR: &str = "LADDER_COOLDOWN_SECS";
/// Environment variable for the first-aggregate history limit (`all` or a count).
pub const INITIAL_HISTORY_VAR: &str = "LADDER_INITIAL_HISTORY";
/// Environment variable overriding the fetch concurrency.
pub const FETCH_CONCURRENCY_VAR: &str = "LADDER_FETCH_CONCURRENCY";
/// Environment variable enabling retention of empty matches.
pub const KEEP_EMPTY_MATCHES_VAR: &str = "LADDER_KEEP_EMPTY_MATCHES";

/// Minimum spacing between refresh cycles.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(120);
/// Matches pulled for a new account's first aggregate.
pub const DEFAULT_INITIAL_HISTORY_LIMIT: u32 = 20;

/// Where and how to reach the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Regional routing host, e.g. `https://americas.api.riotgames.com`.
    pub base_url: String,
    /// Key sent in the `X-Riot-Token` header.
    pub api_key: ApiKey,
    /// Per-request timeout. `None` leaves reqwest's default.
    pub timeout: Option<Duration>,
}

impl UpstreamConfig {
    /// Config for the default base URL.
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            timeout: None,
        }
    }

    /// Load from `RIOT_API_KEY` and `RIOT_BASE_URL`.
    pub fn from_env() -> Result<Self, LadderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), but `None` when no key is set.
    pub fn try_from_env() -> Option<Self> {
        Self::from_env().ok()
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LadderError> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .map(ApiKey::new)
            .ok_or_else(|| LadderError::Config(format!("{API_KEY_VAR} is not set")))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|url| !url.trim().is_empty()) {
            config.base_url = base_url.trim().to_string();
        }
        Ok(config)
    }

    /// Build an HTTP client for this config.
    pub fn client(&self) -> RiotClient {
        let mut builder = RiotClient::builder()
            .base_url(self.base_url.clone())
            .api_key(self.api_key.clone());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

/// Refresh cycle policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderConfig {
    /// Minimum time since the last successful cycle before another may run.
    pub cooldown: Duration,
    /// Matches pulled for a new account's first aggregate. `None` = full history.
    pub initial_history_limit: Option<u32>,
    /// Handling of matches with no tracked participant.
    pub empty_match_policy: EmptyMatchPolicy,
    /// Upstream calls in flight per collection stage.
    pub fetch_concurrency: usize,
    /// Attempts per upstream call.
    pub max_attempts: u32,
    /// Merged match ids remembered per account.
    pub ledger_capacity: usize,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            initial_history_limit: Some(DEFAULT_INITIAL_HISTORY_LIMIT),
            empty_match_policy: EmptyMatchPolicy::Drop,
            fetch_concurrency: 4,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            ledger_capacity: DEFAULT_LEDGER_CAPACITY,
        }
    }
}

impl LadderConfig {
    /// Defaults overridden by any `LADDER_*` variables that are set.
    pub fn from_env() -> Result<Self, LadderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` in place of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LadderError> {
        let mut config = Self::default();
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(secs) = get(COOLDOWN_VAR) {
            config.cooldown = Duration::from_secs(parse_number(COOLDOWN_VAR, &secs)?);
        }

        if let Some(limit) = get(INITIAL_HISTORY_VAR) {
            config.initial_history_limit = if limit.eq_ignore_ascii_case("all") {
                None
            } else {
                Some(parse_number(INITIAL_HISTORY_VAR, &limit)?)
            };
        }

        if let Some(concurrency) = get(FETCH_CONCURRENCY_VAR) {
            let concurrency: usize = parse_number(FETCH_CONCURRENCY_VAR, &concurrency)?;
            if concurrency == 0 {
                return Err(LadderError::Config(format!("{FETCH_CONCURRENCY_VAR} must be at least 1")));
            }
            config.fetch_concurrency = concurrency;
        }

        if let Some(keep) = get(KEEP_EMPTY_MATCHES_VAR) {
            config.empty_match_policy = if parse_flag(KEEP_EMPTY_MATCHES_VAR, &keep)? {
                EmptyMatchPolicy::Keep
            } else {
                EmptyMatchPolicy::Drop
            };
        }

        Ok(config)
    }

    /// Settings handed to the match collector.
    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            concurrency: self.fetch_concurrency,
            empty_match_policy: self.empty_match_policy,
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, LadderError> {
    value
        .parse()
        .map_err(|_| LadderError::Config(format!("{name} must be a non-negative integer, got '{value}'")))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, LadderError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LadderError::Config(format!("{name} must be a boolean, got '{value}'"))),
    }
}
