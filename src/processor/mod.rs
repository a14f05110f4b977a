#[cfg(test)]
mod tests;

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    host::SharedRestorer,
    job::{BatchEntry, RestoreJob},
    run_state::RunTracker,
    task::BoundedJoinSet,
};

/// Jobs sent per batch call. Small enough that a pause or cancel takes
/// effect quickly, large enough to amortize the round trip.
pub const BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Jobs a restore was attempted for, whatever the result.
    pub processed: u64,
    /// Invalid entries plus failed restores.
    pub errors: u64,
    pub restored: u64,
    /// Entries received.
    pub total: u64,
}

impl BatchOutcome {
    /// Outcome of a batch that never reached the processor.
    pub fn undelivered(total: u64) -> Self {
        BatchOutcome {
            processed: 0,
            errors: total,
            restored: 0,
            total,
        }
    }
}

/// The request/response boundary between a driver and the processor.
#[async_trait]
pub trait BatchClient: Debug {
    async fn process_batch(&self, batch: Vec<BatchEntry>) -> Result<BatchOutcome>;
}

pub type SharedBatchClient = Arc<dyn BatchClient + Send + Sync + 'static>;

#[derive(Debug, Clone)]
pub struct BatchProcessor {
    restorer: SharedRestorer,
    tracker: Arc<RunTracker>,
    tasks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobOutcome {
    Restored,
    Failed,
}

impl BatchProcessor {
    /// `tasks` bounds how many restores of one batch run concurrently.
    pub fn new(restorer: SharedRestorer, tracker: Arc<RunTracker>, tasks: usize) -> Self {
        BatchProcessor {
            restorer,
            tracker,
            tasks,
        }
    }

    /// Restores every valid entry of `entries`.
    ///
    /// Failures never stop the batch: invalid entries are counted as errors
    /// without a restore attempt, and a failed restore counts as both
    /// processed and an error. Each attempted job decrements its context's
    /// run state exactly once.
    pub async fn process(&self, entries: &[BatchEntry]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome {
            total: entries.len() as u64,
            ..BatchOutcome::default()
        };
        let mut tasks = BoundedJoinSet::new(self.tasks);

        for entry in entries {
            let Ok(job) = RestoreJob::try_from(entry) else {
                warn!("skipping invalid job {entry:?}");
                outcome.errors += 1;
                continue;
            };

            let restorer = self.restorer.clone();
            let tracker = self.tracker.clone();
            tasks
                .spawn(async move { restore_job(restorer, tracker, job).await })
                .await?;
        }

        while let Some(result) = tasks.join_next().await {
            outcome.processed += 1;
            match result {
                Ok(JobOutcome::Restored) => outcome.restored += 1,
                Ok(JobOutcome::Failed) => outcome.errors += 1,
                Err(err) => {
                    warn!("restore task failed: {err}");
                    outcome.errors += 1;
                }
            }
        }

        debug!(
            "batch done: {} processed, {} errors",
            outcome.processed, outcome.errors
        );
        Ok(outcome)
    }
}

async fn restore_job(
    restorer: SharedRestorer,
    tracker: Arc<RunTracker>,
    job: RestoreJob,
) -> JobOutcome {
    // A panicking restorer still has to settle the run state below.
    let attempt = tokio::spawn(async move { restorer.restore(job.id, job.context).await }).await;
    let outcome = match attempt {
        Ok(Ok(())) => JobOutcome::Restored,
        Ok(Err(err)) => {
            warn!("{err}");
            JobOutcome::Failed
        }
        Err(err) => {
            warn!("restore of {} in {} did not finish: {err}", job.id, job.context);
            JobOutcome::Failed
        }
    };

    let restored = outcome == JobOutcome::Restored;
    if let Err(err) = tracker.complete_one(job.context, restored).await {
        warn!("could not update run state: {err}");
    }

    outcome
}

#[async_trait]
impl BatchClient for BatchProcessor {
    async fn process_batch(&self, batch: Vec<BatchEntry>) -> Result<BatchOutcome> {
        self.process(&batch).await
    }
}
