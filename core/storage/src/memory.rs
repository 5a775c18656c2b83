//! In-memory storage backend for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::backend::{ArtifactId, StorageBackend};
use credvault_common::{Error, Result};

/// In-memory storage backend.
///
/// Useful for testing and development. All data is stored in memory
/// and lost on drop. Clones share the same contents.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    storage: Arc<RwLock<HashMap<ArtifactId, Vec<u8>>>>,
}

impl MemoryStorage {
    /// Create a new empty memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts.
    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Check if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Storage("Memory storage lock poisoned".to_string())
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, id: &ArtifactId) -> Result<Option<Vec<u8>>> {
        let storage = self.storage.read().map_err(poisoned)?;
        Ok(storage.get(id).cloned())
    }

    fn write(&self, id: &ArtifactId, data: &[u8]) -> Result<()> {
        let mut storage = self.storage.write().map_err(poisoned)?;
        storage.insert(id.clone(), data.to_vec());
        Ok(())
    }

    fn remove(&self, id: &ArtifactId) -> Result<bool> {
        let mut storage = self.storage.write().map_err(poisoned)?;
        Ok(storage.remove(id).is_some())
    }

    fn exists(&self, id: &ArtifactId) -> Result<bool> {
        let storage = self.storage.read().map_err(poisoned)?;
        Ok(storage.contains_key(id))
    }
}
