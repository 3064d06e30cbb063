//! API key handling.
//!
//! The upstream authenticates every request with a single key sent in the
//! `X-Riot-Token` header. The key is held in a [`SecretString`] so it never
//! shows up in `Debug` output or logs.

use secrecy::{ExposeSecret, SecretString};

/// Default environment variable holding the API key.
pub const API_KEY_VAR: &str = "RIOT_API_KEY";

/// Upstream API key.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Wrap a raw API key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Read the key from `RIOT_API_KEY`.
    ///
    /// Returns `None` if the variable is unset or empty.
    pub fn try_from_env() -> Option<Self> {
        Self::try_from_env_var(API_KEY_VAR)
    }

    /// Read the key from a custom environment variable.
    pub fn try_from_env_var(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }

    /// Get the raw key for the request header.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_debug_redacted() {
        let key = ApiKey::new("RGAPI-super-secret");
        let debug_str = format!("{:?}", key);
        assert!(!debug_str.contains("super-secret"));
        assert!(debug_str.contains("[REDACTED]"));
        assert_eq!(key.expose_secret(), "RGAPI-super-secret");
    }

    #[test]
    fn test_missing_env_var() {
        assert!(ApiKey::try_from_env_var("MATCH_LADDER_TEST_UNSET_KEY_VAR").is_none());
    }
}
