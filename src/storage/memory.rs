use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{Storage, StorageStats};

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<String, Vec<u8>>,
    stats: StorageStats,
}

/// Process-local storage; everything is lost when the process exits.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // a poisoned map is still a valid map
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn exists(&self, key: &str) -> Result<bool> {
        let mut inner = self.lock();
        inner.stats.add_get(0);
        Ok(inner.items.contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let mut inner = self.lock();
        let bytes = inner
            .items
            .get(key)
            .cloned()
            .ok_or_else(|| Error::ItemNotFound(key.to_owned()))?;
        inner.stats.add_get(bytes.len());
        Ok(bytes)
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let mut inner = self.lock();
        inner.stats.add_put(bytes.len());
        inner.items.insert(key.to_owned(), bytes);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.stats.add_delete();
        inner.items.remove(key);
        Ok(())
    }

    fn stats(&self) -> StorageStats {
        self.lock().stats.clone()
    }
}
