use std::{
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::{fs, time::sleep};

use crate::error::{Error, Result};

use super::{Storage, StorageStats};

/// Stores each key as a file below `path`; `/` in keys becomes a directory.
#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    latency: Option<Duration>,
    stats: Arc<Mutex<StorageStats>>,
}

impl LocalStorage {
    pub fn new(path: PathBuf, latency: Option<Duration>) -> Self {
        let stats = Arc::new(Mutex::new(StorageStats::new()));
        LocalStorage {
            path,
            latency,
            stats,
        }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.path.join(key)
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            sleep(latency).await;
        }
    }

    fn record<F: FnOnce(&mut StorageStats)>(&self, f: F) {
        if let Ok(mut stats) = self.stats.lock() {
            f(&mut stats);
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, key: &str) -> Result<bool> {
        self.simulate_latency().await;

        let path = self.object_path(key);
        let exists = fs::try_exists(path).await?;
        self.record(|stats| stats.add_get(0));
        Ok(exists)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.simulate_latency().await;

        let path = self.object_path(key);
        let bytes = fs::read(path).await.map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::ItemNotFound(key.to_owned()),
            _ => err.into(),
        })?;

        self.record(|stats| stats.add_get(bytes.len()));
        Ok(bytes)
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.simulate_latency().await;

        let path = self.object_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // records are replaced atomically
        let temp_path = path.with_extension("tmp");
        let size = bytes.len();
        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &path).await?;

        self.record(|stats| stats.add_put(size));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.simulate_latency().await;

        let path = self.object_path(key);
        match fs::remove_file(path).await {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            result => result,
        }?;

        self.record(StorageStats::add_delete);
        Ok(())
    }

    fn stats(&self) -> StorageStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }
}
