use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::storage::StorageStats;

#[derive(Debug)]
pub struct CommandStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub items_processed: u64,
    pub items_failed: u64,
    pub batches: u64,
    pub checkpoints: u64,
    pub storage: StorageStats,
}

impl CommandStats {
    pub fn new() -> Self {
        CommandStats {
            start_time: Utc::now(),
            end_time: None,
            items_processed: 0,
            items_failed: 0,
            batches: 0,
            checkpoints: 0,
            storage: StorageStats::new(),
        }
    }

    pub fn finalize(mut self, storage: StorageStats) -> Self {
        self.end_time = Some(Utc::now());
        self.storage = storage;
        self
    }

    pub fn elapsed_time(&self) -> Duration {
        let end_time = self.end_time.unwrap_or_else(Utc::now);
        let delta = end_time - self.start_time;
        delta.to_std().unwrap_or_default()
    }
}

impl Default for CommandStats {
    fn default() -> Self {
        CommandStats::new()
    }
}
