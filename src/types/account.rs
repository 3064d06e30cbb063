//! Tracked accounts.

use serde::{Deserialize, Serialize};

/// A tracked game identity.
///
/// `external_id` is the stable key. `display_name#tag_line` is what people
/// type, and is compared case-insensitively when checking for duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Human-facing name.
    pub display_name: String,
    /// Region-ish suffix after the `#`.
    pub tag_line: String,
    /// Stable upstream identifier.
    pub external_id: String,
}

impl Account {
    /// Create a new account.
    pub fn new(
        display_name: impl Into<String>,
        tag_line: impl Into<String>,
        external_id: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            tag_line: tag_line.into(),
            external_id: external_id.into(),
        }
    }

    /// `displayName#tagLine`.
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.display_name, self.tag_line)
    }

    /// Case-insensitive comparison on both name and tag.
    pub fn matches_riot_id(&self, display_name: &str, tag_line: &str) -> bool {
        self.display_name.to_lowercase() == display_name.trim().to_lowercase()
            && self.tag_line.to_lowercase() == tag_line.trim().to_lowercase()
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.display_name, self.tag_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_riot_id_match_is_case_insensitive() {
        let account = Account::new("Foo", "NA1", "puuid-1");
        assert!(account.matches_riot_id("FOO", "na1"));
        assert!(account.matches_riot_id(" foo ", "Na1"));
        assert!(!account.matches_riot_id("Foo", "EUW"));
        assert!(!account.matches_riot_id("Fooo", "NA1"));
    }

    #[test]
    fn test_display() {
        let account = Account::new("Straße", "EUW", "puuid-2");
        assert_eq!(account.to_string(), "Straße#EUW");
        assert!(!account.matches_riot_id("STRASSE", "euw"));
        assert!(account.matches_riot_id("STRAßE", "euw"));
    }
}
