
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    job::RestoreJob,
    keys,
    storage::TransientStore,
};

/// Abandoned queues disappear after a day.
pub const QUEUE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A persisted checkpoint of a restore run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub items: Vec<RestoreJob>,
    pub total: u64,
    pub processed: u64,
    pub saved_at: DateTime<Utc>,
}

impl Queue {
    pub fn remaining(&self) -> u64 {
        self.items.len() as u64
    }
}

pub fn check_counts(total: u64, processed: u64, remaining: u64) -> Result<()> {
    if processed.checked_add(remaining) == Some(total) {
        Ok(())
    } else {
        Err(Error::InvalidQueue {
            total,
            processed,
            remaining,
        })
    }
}

/// The single durable handle to the current queue. Every save replaces the
/// whole record; the last writer wins.
#[derive(Debug, Clone)]
pub struct QueueStore {
    store: TransientStore,
}

impl QueueStore {
    pub fn new(store: TransientStore) -> Self {
        QueueStore { store }
    }

    /// Persists `items` as the remaining work and returns how many remain.
    /// An empty queue is never stored: saving one deletes the record.
    pub async fn save(&self, items: &[RestoreJob], total: u64, processed: u64) -> Result<u64> {
        if items.is_empty() {
            self.clear().await?;
            return Ok(0);
        }

        let remaining = items.len() as u64;
        check_counts(total, processed, remaining)?;

        let queue = Queue {
            items: items.to_vec(),
            total,
            processed,
            saved_at: Utc::now(),
        };
        self.store.set(keys::QUEUE_KEY, &queue, QUEUE_TTL).await?;

        trace!("saved queue: {processed}/{total} processed, {remaining} remaining");
        Ok(remaining)
    }

    pub async fn load(&self) -> Result<Option<Queue>> {
        self.store.get(keys::QUEUE_KEY).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.delete(keys::QUEUE_KEY).await
    }
}
