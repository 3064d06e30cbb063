//! Error types for the match ladder library.

use thiserror::Error;

/// Errors raised while talking to the upstream match API.
///
/// Callers usually only need [`UpstreamError::is_not_found`]: a missing
/// account or match is a terminal answer, everything else is "try later".
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The upstream reported that the resource does not exist (HTTP 404).
    #[error("{resource} with identifier '{id}' not found")]
    NotFound {
        /// Kind of resource that was requested ("account", "match").
        resource: &'static str,
        /// Identifier that was requested.
        id: String,
    },

    /// The upstream rejected the request despite local throttling (HTTP 429).
    #[error("Rate limit exceeded, retry after {retry_after_ms:?}ms")]
    RateLimited {
        /// Suggested wait in milliseconds, from the `Retry-After` header.
        retry_after_ms: Option<u64>,
    },

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// Request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    /// Reading the response failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// URL construction error.
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Check if the upstream reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Transport(_) | Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::NotFound { .. } | Self::Url(_) | Self::InvalidResponse(_) => false,
        }
    }

    /// Upstream-provided wait hint, if any.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms } => *retry_after_ms,
            _ => None,
        }
    }
}

/// A persistence operation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("store {operation} failed: {message}")]
pub struct StoreError {
    /// Name of the store operation ("put_aggregate", ...).
    pub operation: &'static str,
    /// Backend-specific description.
    pub message: String,
}

impl StoreError {
    /// Create a new store error.
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// The main error type for ladder operations.
#[derive(Error, Debug)]
pub enum LadderError {
    /// Upstream call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The upstream has no account with this name and tag.
    #[error("account does not exist: {display_name}#{tag_line}")]
    AccountNotFound {
        /// Display name that was looked up.
        display_name: String,
        /// Tag line that was looked up.
        tag_line: String,
    },

    /// The account is already on the roster.
    #[error("account {display_name}#{tag_line} is already on the roster")]
    AlreadyExists {
        /// Display name of the existing entry.
        display_name: String,
        /// Tag line of the existing entry.
        tag_line: String,
    },

    /// No roster entry with this external id.
    #[error("no account with external id '{0}' on the roster")]
    UnknownAccount(String),

    /// Leaderboard metric name not recognised.
    #[error("unknown leaderboard metric '{0}'")]
    UnknownMetric(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_terminal() {
        let err = UpstreamError::NotFound {
            resource: "account",
            id: "Foo#NA1".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "account with identifier 'Foo#NA1' not found");
    }

    #[test]
    fn test_transient_classification() {
        let server_error = UpstreamError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        let bad_request = UpstreamError::Status {
            status: 400,
            body: "bad".to_string(),
        };
        let limited = UpstreamError::RateLimited {
            retry_after_ms: Some(1000),
        };

        assert!(server_error.is_transient());
        assert!(!bad_request.is_transient());
        assert!(limited.is_transient());
        assert_eq!(limited.retry_after_ms(), Some(1000));
    }

    #[test]
    fn test_account_not_found_message() {
        let err = LadderError::AccountNotFound {
            display_name: "Foo".to_string(),
            tag_line: "NA1".to_string(),
        };
        assert!(err.to_string().contains("account does not exist"));
    }
}
