//! In-memory store.

use std::collections::HashMap;

use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::store::Store;
use crate::types::{Account, PersistedAggregate};

/// A [`Store`] kept entirely in process memory.
///
/// Nothing survives a restart. Share it as `Arc<MemoryStore>`.
///
/// # Example
///
/// ```rust
/// use match_ladder::store::{MemoryStore, Store};
/// use match_ladder::types::Account;
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// store.put_account(&Account::new("Foo", "NA1", "puuid-foo")).await.unwrap();
/// assert_eq!(store.list_accounts().await.unwrap().len(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    aggregates: HashMap<String, PersistedAggregate>,
    processing: bool,
    watermark: Option<OffsetDateTime>,
    last_refresh: Option<OffsetDateTime>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn get_account(&self, external_id: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.state.read().await.accounts.get(external_id).cloned())
    }

    async fn put_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.accounts.insert(account.external_id.clone(), account.clone());
        Ok(())
    }

    async fn delete_account(&self, external_id: &str) -> Result<bool, StoreError> {
        Ok(self.state.write().await.accounts.remove(external_id).is_some())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.state.read().await.accounts.values().cloned().collect())
    }

    async fn get_aggregate(&self, external_id: &str) -> Result<Option<PersistedAggregate>, StoreError> {
        Ok(self.state.read().await.aggregates.get(external_id).cloned())
    }

    async fn put_aggregate(&self, aggregate: &PersistedAggregate) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state
            .aggregates
            .insert(aggregate.external_id.clone(), aggregate.clone());
        Ok(())
    }

    async fn delete_aggregate(&self, external_id: &str) -> Result<(), StoreError> {
        self.state.write().await.aggregates.remove(external_id);
        Ok(())
    }

    async fn scan_all_aggregates(&self) -> Result<Vec<PersistedAggregate>, StoreError> {
        Ok(self.state.read().await.aggregates.values().cloned().collect())
    }

    async fn get_processing_flag(&self) -> Result<bool, StoreError> {
        Ok(self.state.read().await.processing)
    }

    async fn set_processing_flag(&self, processing: bool) -> Result<(), StoreError> {
        self.state.write().await.processing = processing;
        Ok(())
    }

    async fn get_watermark(&self) -> Result<Option<OffsetDateTime>, StoreError> {
        Ok(self.state.read().await.watermark)
    }

    async fn put_watermark(&self, watermark: OffsetDateTime) -> Result<(), StoreError> {
        self.state.write().await.watermark = Some(watermark);
        Ok(())
    }

    async fn get_last_refresh(&self) -> Result<Option<OffsetDateTime>, StoreError> {
        Ok(self.state.read().await.last_refresh)
    }

    async fn put_last_refresh(&self, at: OffsetDateTime) -> Result<(), StoreError> {
        self.state.write().await.last_refresh = Some(at);
        Ok(())
    }
}
