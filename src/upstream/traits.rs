//! Trait definition for the upstream match source.
//!
//! [`MatchSource`] abstracts the three read operations the ladder needs.
//! This enables:
//! - Fake implementations for testing collection and refresh cycles
//! - Decorator pattern (the [`ThrottledClient`](super::ThrottledClient) wrapper)
//!
//! # Example
//!
//! ```rust,ignore
//! use match_ladder::upstream::{MatchIdsRequest, MatchSource};
//!
//! async fn latest<S: MatchSource>(source: &S, puuid: &str) -> Result<(), match_ladder::UpstreamError> {
//!     let ids = source.list_match_ids(puuid, &MatchIdsRequest::default().with_count(1)).await?;
//!     if let Some(id) = ids.first() {
//!         let record = source.fetch_match(id).await?;
//!         println!("{} had {} participants", record.match_id, record.participants.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::error::UpstreamError;
use crate::types::{Account, MatchRecord};
use crate::upstream::MatchIdsRequest;

/// Idempotent upstream reads used by the collector.
pub trait MatchSource: Send + Sync {
    /// Resolve `displayName#tagLine` to an account.
    ///
    /// Fails with [`UpstreamError::NotFound`] if the upstream has no such account.
    fn resolve_account(
        &self,
        display_name: &str,
        tag_line: &str,
    ) -> impl Future<Output = Result<Account, UpstreamError>> + Send;

    /// List match ids for an account, most recent first.
    fn list_match_ids(
        &self,
        external_id: &str,
        request: &MatchIdsRequest,
    ) -> impl Future<Output = Result<Vec<String>, UpstreamError>> + Send;

    /// Fetch one match with every participant.
    fn fetch_match(
        &self,
        match_id: &str,
    ) -> impl Future<Output = Result<MatchRecord, UpstreamError>> + Send;
}

impl<S: MatchSource> MatchSource for Arc<S> {
    async fn resolve_account(
        &self,
        display_name: &str,
        tag_line: &str,
    ) -> Result<Account, UpstreamError> {
        (**self).resolve_account(display_name, tag_line).await
    }

    async fn list_match_ids(
        &self,
        external_id: &str,
        request: &MatchIdsRequest,
    ) -> Result<Vec<String>, UpstreamError> {
        (**self).list_match_ids(external_id, request).await
    }

    async fn fetch_match(&self, match_id: &str) -> Result<MatchRecord, UpstreamError> {
        (**self).fetch_match(match_id).await
    }
}
