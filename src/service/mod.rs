#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use crate::{
    enumerate::Enumerator,
    error::{Error, Result},
    host::{SharedCatalog, SharedRestorer},
    job::{BatchEntry, Context, MediaId, RestoreJob},
    keys,
    processor::{BatchClient, BatchOutcome, BatchProcessor},
    progress::Progress,
    queue::{Queue, QueueStore},
    run_state::{RunResult, RunTracker},
    stats::{ContextStats, StatsAggregator},
    storage::{StorageStats, TransientStore},
};

/// Work selected for one context by [`RestoreService::start_restore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorePlan {
    pub context: Context,
    pub jobs: Vec<RestoreJob>,
}

impl RestorePlan {
    pub fn total(&self) -> u64 {
        self.jobs.len() as u64
    }
}

/// Every operation the command line needs, over one catalog and one store.
#[derive(Debug)]
pub struct RestoreService {
    catalog: SharedCatalog,
    store: TransientStore,
    enumerator: Enumerator,
    aggregator: StatsAggregator,
    queue: QueueStore,
    tracker: Arc<RunTracker>,
    processor: BatchProcessor,
}

impl RestoreService {
    /// `tasks` bounds concurrent restores within one batch.
    pub fn new(
        catalog: SharedCatalog,
        restorer: SharedRestorer,
        store: TransientStore,
        tasks: usize,
    ) -> Self {
        let tracker = Arc::new(RunTracker::new(store.clone()));
        RestoreService {
            enumerator: Enumerator::new(catalog.clone(), store.clone()),
            aggregator: StatsAggregator::new(catalog.clone(), store.clone()),
            queue: QueueStore::new(store.clone()),
            processor: BatchProcessor::new(restorer, tracker.clone(), tasks),
            tracker,
            catalog,
            store,
        }
    }

    /// Selects every restorable item of `context` and starts tracking them.
    pub async fn start_restore(&self, context: Context) -> Result<RestorePlan> {
        if !self.catalog.is_available(context).await? {
            return Err(Error::ContextUnavailable(context));
        }

        let ids = self.enumerator.enumerate(context, true).await?;
        if ids.is_empty() {
            return Err(Error::NothingToRestore(context));
        }

        let jobs: Vec<_> = ids
            .into_iter()
            .map(|id| RestoreJob::new(id, context))
            .collect();
        self.tracker.begin(context, jobs.len() as u64).await?;

        info!("{} items to restore in {context}", jobs.len());
        Ok(RestorePlan { context, jobs })
    }

    /// Restorable ids of `context` for display, capped and cached.
    pub async fn preview(&self, context: Context) -> Result<Vec<MediaId>> {
        if !self.catalog.is_available(context).await? {
            return Ok(vec![]);
        }

        self.enumerator.enumerate(context, false).await
    }

    pub async fn is_available(&self, context: Context) -> Result<bool> {
        self.catalog.is_available(context).await
    }

    pub async fn process_batch(&self, batch: &[BatchEntry]) -> Result<BatchOutcome> {
        self.processor.process(batch).await
    }

    pub async fn get_queue(&self) -> Result<Queue> {
        self.queue.load().await?.ok_or(Error::QueueNotFound)
    }

    pub async fn save_queue(&self, items: &[RestoreJob], total: u64, processed: u64) -> Result<u64> {
        self.queue.save(items, total, processed).await
    }

    pub async fn cancel_queue(&self) -> Result<()> {
        self.queue.clear().await?;
        debug!("queue deleted");
        Ok(())
    }

    pub fn queue_store(&self) -> QueueStore {
        self.queue.clone()
    }

    pub async fn get_progress(&self) -> Result<Progress> {
        self.tracker.progress().await
    }

    pub async fn get_result(&self) -> Result<RunResult> {
        self.tracker.result().await
    }

    pub async fn get_stats(&self, context: Context) -> Result<ContextStats> {
        self.aggregator.stats(context).await
    }

    /// Drops cached stats of `context` after its files changed.
    pub async fn invalidate_stats(&self, context: Context) -> Result<()> {
        self.aggregator.invalidate(context).await
    }

    pub async fn clear_complete_flag(&self) -> Result<()> {
        self.tracker.clear_complete().await
    }

    /// Deletes run states, the completion record and every cached list or
    /// stat. A saved queue is left alone.
    pub async fn clear_cache(&self) -> Result<()> {
        self.store.delete_many(&keys::transient_keys()).await?;
        info!("cleared run state and caches");
        Ok(())
    }

    pub fn storage_stats(&self) -> StorageStats {
        self.store.stats()
    }
}

#[async_trait]
impl BatchClient for RestoreService {
    async fn process_batch(&self, batch: Vec<BatchEntry>) -> Result<BatchOutcome> {
        self.processor.process(&batch).await
    }
}
