//! In-memory backend.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tc_proto::ResourceId;

use super::{Backend, BackendError, BackendResult, ResourceRecord};

/// Backend keeping records in a locked map. Records live as long as the
/// process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<ResourceId, ResourceRecord>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, record: ResourceRecord) -> BackendResult<()> {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Err(BackendError::AlreadyExists(record.id));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &ResourceId) -> BackendResult<Option<ResourceRecord>> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn replace(&self, record: ResourceRecord) -> BackendResult<()> {
        let mut records = self.records.write();
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(BackendError::NotFound(record.id)),
        }
    }

    async fn remove(&self, id: &ResourceId) -> BackendResult<ResourceRecord> {
        self.records
            .write()
            .remove(id)
            .ok_or_else(|| BackendError::NotFound(id.clone()))
    }
}
