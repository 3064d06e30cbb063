//! Persistence seam.
//!
//! The ladder keeps the roster, one aggregate per account, the processing
//! flag, the roster-wide data watermark and the last refresh time. [`Store`]
//! abstracts a key-value backend holding them; [`MemoryStore`] is the
//! in-process implementation.

mod memory;

pub use memory::MemoryStore;

use std::future::Future;
use std::sync::Arc;

use time::OffsetDateTime;

use crate::error::StoreError;
use crate::types::{Account, PersistedAggregate};

/// Key-value persistence for accounts, aggregates, and cycle state.
///
/// Writes are full replacements keyed by external id.
pub trait Store: Send + Sync {
    /// Get an account by external id.
    fn get_account(
        &self,
        external_id: &str,
    ) -> impl Future<Output = Result<Option<Account>, StoreError>> + Send;

    /// Insert or replace an account.
    fn put_account(&self, account: &Account) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete an account. Returns whether it existed.
    fn delete_account(&self, external_id: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Every account on the roster, in no particular order.
    fn list_accounts(&self) -> impl Future<Output = Result<Vec<Account>, StoreError>> + Send;

    /// Get an account's aggregate.
    fn get_aggregate(
        &self,
        external_id: &str,
    ) -> impl Future<Output = Result<Option<PersistedAggregate>, StoreError>> + Send;

    /// Insert or replace an aggregate.
    fn put_aggregate(
        &self,
        aggregate: &PersistedAggregate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete an account's aggregate, if any.
    fn delete_aggregate(&self, external_id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Every stored aggregate, in no particular order.
    fn scan_all_aggregates(
        &self,
    ) -> impl Future<Output = Result<Vec<PersistedAggregate>, StoreError>> + Send;

    /// Whether a merge cycle is in progress.
    fn get_processing_flag(&self) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Set the processing flag.
    fn set_processing_flag(&self, processing: bool) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Lower bound for the next roster-wide `since` query.
    fn get_watermark(&self) -> impl Future<Output = Result<Option<OffsetDateTime>, StoreError>> + Send;

    /// Advance the data watermark.
    fn put_watermark(&self, watermark: OffsetDateTime) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Start time of the last completed roster refresh. Drives the cooldown.
    fn get_last_refresh(&self) -> impl Future<Output = Result<Option<OffsetDateTime>, StoreError>> + Send;

    /// Record a completed roster refresh.
    fn put_last_refresh(&self, at: OffsetDateTime) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<S: Store> Store for Arc<S> {
    async fn get_account(&self, external_id: &str) -> Result<Option<Account>, StoreError> {
        (**self).get_account(external_id).await
    }

    async fn put_account(&self, account: &Account) -> Result<(), StoreError> {
        (**self).put_account(account).await
    }

    async fn delete_account(&self, external_id: &str) -> Result<bool, StoreError> {
        (**self).delete_account(external_id).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        (**self).list_accounts().await
    }

    async fn get_aggregate(&self, external_id: &str) -> Result<Option<PersistedAggregate>, StoreError> {
        (**self).get_aggregate(external_id).await
    }

    async fn put_aggregate(&self, aggregate: &PersistedAggregate) -> Result<(), StoreError> {
        (**self).put_aggregate(aggregate).await
    }

    async fn delete_aggregate(&self, external_id: &str) -> Result<(), StoreError> {
        (**self).delete_aggregate(external_id).await
    }

    async fn scan_all_aggregates(&self) -> Result<Vec<PersistedAggregate>, StoreError> {
        (**self).scan_all_aggregates().await
    }

    async fn get_processing_flag(&self) -> Result<bool, StoreError> {
        (**self).get_processing_flag().await
    }

    async fn set_processing_flag(&self, processing: bool) -> Result<(), StoreError> {
        (**self).set_processing_flag(processing).await
    }

    async fn get_watermark(&self) -> Result<Option<OffsetDateTime>, StoreError> {
        (**self).get_watermark().await
    }

    async fn put_watermark(&self, watermark: OffsetDateTime) -> Result<(), StoreError> {
        (**self).put_watermark(watermark).await
    }

    async fn get_last_refresh(&self) -> Result<Option<OffsetDateTime>, StoreError> {
        (**self).get_last_refresh().await
    }

    async fn put_last_refresh(&self, at: OffsetDateTime) -> Result<(), StoreError> {
        (**self).put_last_refresh(at).await
    }
}
