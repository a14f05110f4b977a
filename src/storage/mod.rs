mod local;
mod memory;
mod stats;
mod transient;
mod url;

#[cfg(test)]
mod tests;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::{Error, Result};

pub use {
    local::LocalStorage, memory::MemoryStorage, stats::StorageStats, transient::TransientStore,
    url::StorageUrl,
};

pub type BoxedStorage = Box<dyn Storage + Sync + Send + 'static>;

#[async_trait]
pub trait Storage: Debug {
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;

    fn stats(&self) -> StorageStats;

    async fn try_get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.get(key).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(Error::ItemNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.delete(key).await?;
        }

        Ok(())
    }
}

pub fn create_storage(url: &StorageUrl, latency: Option<std::time::Duration>) -> BoxedStorage {
    match url {
        StorageUrl::Local(path) => Box::new(LocalStorage::new(path.clone(), latency)),
        StorageUrl::Memory => Box::new(MemoryStorage::new()),
    }
}
