//! The loop that drains a restore queue batch by batch.
//!
//! ```text
//! Idle -> Running -> { Paused, Completed, Canceled }
//! Paused -> Running | Canceled
//! ```


use std::{collections::VecDeque, fmt::Debug, sync::Arc, time::Duration};

use log::{debug, info, warn};
use tokio::{
    sync::Mutex,
    time::{interval, MissedTickBehavior},
};

use crate::{
    error::{Error, Result},
    job::{BatchEntry, RestoreJob},
    processor::{BatchOutcome, SharedBatchClient, BATCH_SIZE},
    progress::Progress,
    queue::{Queue, QueueStore},
};

pub const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DriverStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Canceled,
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub batch_size: usize,
    pub checkpoint_interval: Duration,
    /// Pause after this many batch calls in a row fail outright.
    /// `None` keeps going no matter what.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            batch_size: BATCH_SIZE,
            checkpoint_interval: CHECKPOINT_INTERVAL,
            max_consecutive_failures: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorControl {
    pub is_processing: bool,
    pub is_paused: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    pub total: u64,
    pub processed: u64,
    pub errors: u64,
    pub batches: u64,
    pub checkpoints: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    Batch {
        outcome: BatchOutcome,
        progress: Progress,
    },
    Paused(Progress),
    Completed(Progress),
    Canceled,
}

pub trait DriverObserver: Debug + Send + Sync {
    fn notify(&self, event: &DriverEvent);
}

#[derive(Debug, Default)]
struct Session {
    queue: VecDeque<RestoreJob>,
    in_flight: Vec<RestoreJob>,
    total: u64,
    processed: u64,
    errors: u64,
    batches: u64,
    checkpoints: u64,
    consecutive_failures: u32,
    control: ProcessorControl,
    status: DriverStatus,
    /// Set once a queue was started or loaded. An unseeded session owns
    /// nothing in the store and must never write to it.
    seeded: bool,
}

impl Session {
    fn seed(&mut self, items: Vec<RestoreJob>, total: u64, processed: u64) {
        *self = Session {
            queue: items.into(),
            total,
            processed,
            checkpoints: self.checkpoints,
            seeded: true,
            ..Session::default()
        };
    }

    /// Whether the stored queue belongs to this session.
    fn owns_queue(&self) -> bool {
        self.seeded && !matches!(self.status, DriverStatus::Completed | DriverStatus::Canceled)
    }

    /// Everything not yet acknowledged by the processor, in order.
    fn pending(&self) -> Vec<RestoreJob> {
        self.in_flight
            .iter()
            .chain(self.queue.iter())
            .copied()
            .collect()
    }

    fn progress(&self) -> Progress {
        Progress::from_counts(self.total, self.processed)
    }
}

enum Step {
    Batch(Vec<RestoreJob>),
    Stop(DriverStatus),
}

/// Owns the in-memory queue of one restore session.
///
/// At most one batch call is outstanding at any time. Session state lives
/// behind a single lock that is also held for every write to the queue
/// store, so checkpoints, pauses and cancels never interleave.
#[derive(Debug)]
pub struct Driver {
    client: SharedBatchClient,
    store: QueueStore,
    config: DriverConfig,
    observer: Option<Arc<dyn DriverObserver>>,
    session: Mutex<Session>,
}

impl Driver {
    pub fn new(client: SharedBatchClient, store: QueueStore, config: DriverConfig) -> Self {
        Driver {
            client,
            store,
            config,
            observer: None,
            session: Mutex::new(Session::default()),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DriverObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replaces the session with a fresh queue of `jobs` and persists it.
    pub async fn start(&self, jobs: Vec<RestoreJob>) -> Result<()> {
        let mut session = self.session.lock().await;
        if session.control.is_processing {
            return Err(Error::AlreadyRunning);
        }

        let total = jobs.len() as u64;
        self.store.save(&jobs, total, 0).await?;
        session.seed(jobs, total, 0);
        info!("queued {total} items");
        Ok(())
    }

    /// Rebuilds the session from the persisted checkpoint.
    pub async fn load_saved(&self) -> Result<Queue> {
        let mut session = self.session.lock().await;
        if session.control.is_processing {
            return Err(Error::AlreadyRunning);
        }

        let queue = self.store.load().await?.ok_or(Error::QueueNotFound)?;
        session.seed(queue.items.clone(), queue.total, queue.processed);
        info!(
            "resuming queue: {}/{} processed, {} remaining",
            queue.processed,
            queue.total,
            queue.remaining()
        );
        Ok(queue)
    }

    /// Processes batches until the queue is empty, paused or canceled.
    ///
    /// Calling this while another call is still processing does nothing and
    /// returns the current status.
    pub async fn run(&self) -> Result<DriverStatus> {
        {
            let mut session = self.session.lock().await;
            if session.control.is_processing {
                debug!("already processing");
                return Ok(session.status);
            }

            if session.status == DriverStatus::Canceled {
                return Ok(DriverStatus::Canceled);
            }

            if !session.seeded {
                debug!("nothing queued");
                return Ok(session.status);
            }

            session.control.is_processing = true;
            session.status = DriverStatus::Running;
        }

        let mut ticker = interval(self.config.checkpoint_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let status = loop {
            let batch = match self.next_step().await {
                Step::Batch(batch) => batch,
                Step::Stop(status) => break status,
            };

            let entries = batch.iter().copied().map(BatchEntry::from).collect();
            let call = self.client.process_batch(entries);
            tokio::pin!(call);

            let result = loop {
                tokio::select! {
                    result = &mut call => break result,
                    _ = ticker.tick() => {
                        if let Err(err) = self.checkpoint().await {
                            warn!("could not save queue: {err}");
                        }
                    }
                }
            };

            self.finish_batch(batch.len() as u64, result).await;
        };

        self.stop(status).await
    }

    async fn next_step(&self) -> Step {
        let mut session = self.session.lock().await;

        if session.status == DriverStatus::Canceled {
            return Step::Stop(DriverStatus::Canceled);
        }

        if session.control.is_paused {
            return Step::Stop(DriverStatus::Paused);
        }

        if session.queue.is_empty() {
            return Step::Stop(DriverStatus::Completed);
        }

        let count = self.config.batch_size.max(1).min(session.queue.len());
        let batch: Vec<_> = session.queue.drain(..count).collect();
        session.in_flight.clone_from(&batch);

        debug!(
            "processing batch of {count}, {} remaining",
            session.queue.len()
        );
        Step::Batch(batch)
    }

    async fn finish_batch(&self, count: u64, result: Result<BatchOutcome>) {
        let mut session = self.session.lock().await;
        session.in_flight.clear();
        session.processed += count;
        session.batches += 1;

        let outcome = match result {
            Ok(outcome) => {
                session.consecutive_failures = 0;
                outcome
            }
            Err(err) => {
                warn!("batch of {count} failed: {err}");
                session.consecutive_failures += 1;
                self.maybe_trip(&mut session);
                BatchOutcome::undelivered(count)
            }
        };

        session.errors += outcome.errors;
        let progress = session.progress();
        drop(session);

        self.notify(&DriverEvent::Batch { outcome, progress });
    }

    fn maybe_trip(&self, session: &mut Session) {
        let Some(limit) = self.config.max_consecutive_failures else {
            return;
        };

        if session.consecutive_failures >= limit && !session.control.is_paused {
            warn!(
                "pausing after {} failed batches in a row",
                session.consecutive_failures
            );
            session.control.is_paused = true;
        }
    }

    async fn stop(&self, status: DriverStatus) -> Result<DriverStatus> {
        let mut session = self.session.lock().await;
        session.control.is_processing = false;

        let result = match status {
            DriverStatus::Completed => {
                session.status = DriverStatus::Completed;
                let progress = session.progress();
                let cleared = self.store.clear().await;
                drop(session);

                info!("restore finished: {} items processed", progress.processed);
                self.notify(&DriverEvent::Completed(progress));
                cleared
            }
            DriverStatus::Paused => {
                session.status = DriverStatus::Paused;
                let saved = self.save_locked(&mut session).await;
                let progress = session.progress();
                drop(session);

                self.notify(&DriverEvent::Paused(progress));
                saved.map(|_| ())
            }
            DriverStatus::Canceled => {
                drop(session);
                self.notify(&DriverEvent::Canceled);
                Ok(())
            }
            DriverStatus::Idle | DriverStatus::Running => Ok(()),
        };

        result.map(|()| status)
    }

    /// Persists the current position. Returns the number of items saved.
    pub async fn checkpoint(&self) -> Result<u64> {
        let mut session = self.session.lock().await;
        self.save_locked(&mut session).await
    }

    async fn save_locked(&self, session: &mut Session) -> Result<u64> {
        if !session.owns_queue() {
            return Ok(0);
        }

        let pending = session.pending();
        let remaining = self
            .store
            .save(&pending, session.total, session.processed)
            .await?;
        session.checkpoints += 1;
        Ok(remaining)
    }

    /// Stops issuing batches once the in-flight one (if any) completes, and
    /// saves a checkpoint right away.
    ///
    /// A driver with no queue of its own, or one that already completed or
    /// was canceled, is left untouched.
    pub async fn pause(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        if !session.owns_queue() {
            debug!("nothing to pause");
            return Ok(());
        }

        session.control.is_paused = true;
        if !session.control.is_processing {
            session.status = DriverStatus::Paused;
        }

        self.save_locked(&mut session).await?;
        info!("paused at {}/{}", session.processed, session.total);
        Ok(())
    }

    /// Continues the in-memory queue after a pause.
    ///
    /// If the previous loop is still finishing its last batch it simply keeps
    /// going, and this call returns immediately.
    pub async fn resume(&self) -> Result<DriverStatus> {
        {
            let mut session = self.session.lock().await;
            if session.status == DriverStatus::Canceled {
                return Ok(DriverStatus::Canceled);
            }

            session.control.is_paused = false;
            session.consecutive_failures = 0;
        }

        self.run().await
    }

    /// Drops the queue, in memory and on disk. No further batches are issued.
    /// Like [`Driver::pause`], this leaves a store it does not own alone.
    pub async fn cancel(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        if !session.owns_queue() {
            debug!("nothing to cancel");
            return Ok(());
        }

        session.status = DriverStatus::Canceled;
        session.queue.clear();
        self.store.clear().await?;
        info!("restore canceled at {}/{}", session.processed, session.total);
        Ok(())
    }

    pub async fn status(&self) -> DriverStatus {
        self.session.lock().await.status
    }

    pub async fn control(&self) -> ProcessorControl {
        self.session.lock().await.control
    }

    pub async fn progress(&self) -> Progress {
        self.session.lock().await.progress()
    }

    pub async fn summary(&self) -> DriverSummary {
        let session = self.session.lock().await;
        DriverSummary {
            total: session.total,
            processed: session.processed,
            errors: session.errors,
            batches: session.batches,
            checkpoints: session.checkpoints,
        }
    }

    fn notify(&self, event: &DriverEvent) {
        if let Some(observer) = &self.observer {
            observer.notify(event);
        }
    }
}
