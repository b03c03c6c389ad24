//! Test readmodel repositories.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chronicle_core::{DomainError, ReadmodelRecord, ReadmodelRepository};
use uuid::Uuid;

/// A readmodel repository backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryReadmodelRepository {
    records: Mutex<HashMap<Uuid, ReadmodelRecord>>,
}

impl InMemoryReadmodelRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReadmodelRepository for InMemoryReadmodelRepository {
    async fn save_record(&self, record: ReadmodelRecord) -> Result<(), DomainError> {
        self.records
            .lock()
            .unwrap()
            .insert(record.aggregate_id, record);
        Ok(())
    }

    async fn load_record(
        &self,
        aggregate_id: Uuid,
    ) -> Result<Option<ReadmodelRecord>, DomainError> {
        Ok(self.records.lock().unwrap().get(&aggregate_id).cloned())
    }

    async fn delete(&self, aggregate_id: Uuid) -> Result<(), DomainError> {
        self.records.lock().unwrap().remove(&aggregate_id);
        Ok(())
    }
}

/// A readmodel repository that always returns a storage error.
#[derive(Debug)]
pub struct FailingReadmodelRepository;

#[async_trait]
impl ReadmodelRepository for FailingReadmodelRepository {
    async fn save_record(&self, _record: ReadmodelRecord) -> Result<(), DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn load_record(
        &self,
        _aggregate_id: Uuid,
    ) -> Result<Option<ReadmodelRecord>, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn delete(&self, _aggregate_id: Uuid) -> Result<(), DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }
}
