//! Upstream REST endpoint constants.

/// Default regional routing host for account and match lookups.
pub const DEFAULT_BASE_URL: &str = "https://americas.api.riotgames.com";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-Riot-Token";

/// Account endpoints, as path segments.
pub mod account {
    /// Look up an account by `{gameName}/{tagLine}`.
    pub const BY_RIOT_ID: &[&str] = &["riot", "account", "v1", "accounts", "by-riot-id"];
}

/// Match endpoints, as path segments.
pub mod matches {
    /// Match ids for `{puuid}/ids`.
    pub const BY_PUUID: &[&str] = &["lol", "match", "v5", "matches", "by-puuid"];
    /// A single match by `{matchId}`.
    pub const BY_ID: &[&str] = &["lol", "match", "v5", "matches"];
    /// Trailing segment of the match id listing.
    pub const IDS: &str = "ids";
}
