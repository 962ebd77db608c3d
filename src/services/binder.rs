//! Persistence Binder
//!
//! Associates stored references with their owning records.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::models::{LogicalSlot, StoredImageReference, TransformMetadata};

use super::storage::StorageProvider;

/// Bind error
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("record store failure: {0}")]
    Store(String),
    #[error("no binding for slot: {0}")]
    NotFound(String),
}

/// One stored reference bound to an owning record.
///
/// Exactly one record exists per `(owner, purpose)` slot; `url` is the bare
/// stored URL, never a tokenized display URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundRecord {
    pub slot: LogicalSlot,
    pub bucket: String,
    pub path: String,
    pub url: String,
    /// Framing at confirmation time, restored when the editor reopens.
    pub metadata: Option<TransformMetadata>,
    pub updated_at: DateTime<Utc>,
}

/// Contract with the external owning-record repository.
#[async_trait]
pub trait OwnerRecordStore: Send + Sync {
    /// Insert or replace the record for its slot, returning the previous
    /// record when one existed.
    async fn upsert(&self, record: BoundRecord) -> Result<Option<BoundRecord>, BindError>;

    async fn get(&self, slot: &LogicalSlot) -> Result<Option<BoundRecord>, BindError>;

    /// Remove the record for a slot, returning it when one existed.
    async fn delete(&self, slot: &LogicalSlot) -> Result<Option<BoundRecord>, BindError>;
}

/// In-memory record store (would be the platform's relational tables in
/// production).
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Arc<RwLock<HashMap<LogicalSlot, BoundRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OwnerRecordStore for MemoryRecordStore {
    async fn upsert(&self, record: BoundRecord) -> Result<Option<BoundRecord>, BindError> {
        let mut records = self.records.write().await;
        Ok(records.insert(record.slot.clone(), record))
    }

    async fn get(&self, slot: &LogicalSlot) -> Result<Option<BoundRecord>, BindError> {
        let records = self.records.read().await;
        Ok(records.get(slot).cloned())
    }

    async fn delete(&self, slot: &LogicalSlot) -> Result<Option<BoundRecord>, BindError> {
        let mut records = self.records.write().await;
        Ok(records.remove(slot))
    }
}

/// Orchestrates "bind reference to owner" as one logical operation.
pub struct PersistenceBinder {
    store: Arc<dyn OwnerRecordStore>,
    provider: Arc<dyn StorageProvider>,
}

impl PersistenceBinder {
    pub fn new(store: Arc<dyn OwnerRecordStore>, provider: Arc<dyn StorageProvider>) -> Self {
        Self { store, provider }
    }

    /// Upsert the reference under its slot.
    ///
    /// A previously bound object becomes orphaned storage; its removal is
    /// attempted opportunistically and is never required for correctness.
    pub async fn bind(
        &self,
        slot: &LogicalSlot,
        reference: &StoredImageReference,
        metadata: Option<TransformMetadata>,
    ) -> Result<BoundRecord, BindError> {
        let record = BoundRecord {
            slot: slot.clone(),
            bucket: reference.bucket.clone(),
            path: reference.path.clone(),
            url: reference.base_url.clone(),
            metadata,
            updated_at: Utc::now(),
        };

        let previous = self.store.upsert(record.clone()).await?;

        if let Some(previous) = previous {
            self.remove_orphan(&previous, reference).await;
        }

        Ok(record)
    }

    /// Load the record bound to a slot, if any.
    pub async fn load(&self, slot: &LogicalSlot) -> Result<Option<BoundRecord>, BindError> {
        self.store.get(slot).await
    }

    /// Delete a slot's binding and opportunistically remove its object.
    pub async fn unbind(&self, slot: &LogicalSlot) -> Result<BoundRecord, BindError> {
        let record = self
            .store
            .delete(slot)
            .await?
            .ok_or_else(|| BindError::NotFound(slot.to_string()))?;

        if let Err(e) = self
            .provider
            .remove(&record.bucket, &[record.path.clone()])
            .await
        {
            tracing::warn!(slot = %slot, error = %e, "orphan cleanup failed");
        }

        Ok(record)
    }

    async fn remove_orphan(&self, previous: &BoundRecord, current: &StoredImageReference) {
        if previous.bucket == current.bucket && previous.path == current.path {
            return;
        }

        if let Err(e) = self
            .provider
            .remove(&previous.bucket, &[previous.path.clone()])
            .await
        {
            tracing::warn!(
                bucket = %previous.bucket,
                path = %previous.path,
                error = %e,
                "orphan cleanup failed"
            );
        }
    }
}
