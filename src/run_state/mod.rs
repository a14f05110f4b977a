
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    error::Result,
    job::Context,
    keys,
    progress::{Progress, RunState},
    storage::TransientStore,
};

pub const RUN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Outcome counts of the current run, kept until the completion is acknowledged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub restored: u64,
    pub failed: u64,
}

/// Durable per-context counters shared by everything that completes jobs.
///
/// Every read-modify-write goes through one lock, so overlapping completions
/// from concurrent restores never lose a decrement.
#[derive(Debug)]
pub struct RunTracker {
    store: TransientStore,
    lock: Mutex<()>,
}

impl RunTracker {
    pub fn new(store: TransientStore) -> Self {
        RunTracker {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Starts tracking `total` jobs for `context`, replacing any previous state
    /// and any unacknowledged completion.
    pub async fn begin(&self, context: Context, total: u64) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store
            .set(&keys::running(context), &RunState::new(total), RUN_TTL)
            .await?;
        self.store.delete(keys::COMPLETE_KEY).await?;
        self.store.delete(keys::RESULT_KEY).await?;
        debug!("tracking {total} jobs in {context}");
        Ok(())
    }

    /// Records one finished job of `context`, successful or not.
    pub async fn complete_one(&self, context: Context, restored: bool) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut result: RunResult = self.store.get(keys::RESULT_KEY).await?.unwrap_or_default();
        if restored {
            result.restored += 1;
        } else {
            result.failed += 1;
        }
        self.store.set(keys::RESULT_KEY, &result, RUN_TTL).await?;

        let key = keys::running(context);
        let Some(mut state) = self.store.get::<RunState>(&key).await? else {
            return Ok(());
        };

        state.remaining = state.remaining.saturating_sub(1);
        if state.remaining > 0 {
            return self.store.set(&key, &state, RUN_TTL).await;
        }

        self.store.delete(&key).await?;
        debug!("all jobs in {context} finished");

        if self.states().await?.is_empty() {
            self.store.set(keys::COMPLETE_KEY, &true, RUN_TTL).await?;
            info!(
                "restore complete: {} restored, {} failed",
                result.restored, result.failed
            );
        }

        Ok(())
    }

    pub async fn state(&self, context: Context) -> Result<Option<RunState>> {
        self.store.get(&keys::running(context)).await
    }

    async fn states(&self) -> Result<Vec<RunState>> {
        let mut states = vec![];
        for context in Context::ALL {
            if let Some(state) = self.state(context).await? {
                states.push(state);
            }
        }

        Ok(states)
    }

    pub async fn is_complete(&self) -> Result<bool> {
        let complete = self.store.get(keys::COMPLETE_KEY).await?;
        Ok(complete.unwrap_or(false))
    }

    pub async fn result(&self) -> Result<RunResult> {
        let result = self.store.get(keys::RESULT_KEY).await?;
        Ok(result.unwrap_or_default())
    }

    pub async fn progress(&self) -> Result<Progress> {
        let _guard = self.lock.lock().await;
        let states = self.states().await?;
        let is_complete = self.is_complete().await?;
        Ok(Progress::from_states(&states, is_complete))
    }

    /// Acknowledges a finished run.
    pub async fn clear_complete(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store.delete(keys::COMPLETE_KEY).await?;
        self.store.delete(keys::RESULT_KEY).await
    }
}
