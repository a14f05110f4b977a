use std::{collections::BTreeSet, sync::Arc};

use clap::builder::styling::AnsiColor;
use humantime::format_duration;
use log::{info, warn};
use tokio::{signal::ctrl_c, spawn};

use crate::{
    driver::{Driver, DriverConfig, DriverEvent, DriverObserver, DriverStatus},
    error::Result,
    format::{format_percent, format_size},
    job::Context,
    processor::BATCH_SIZE,
    service::RestoreService,
    stats::CommandStats,
};

use super::{args::DriverArgs, print_stat};

#[derive(Debug)]
struct LogObserver;

impl DriverObserver for LogObserver {
    fn notify(&self, event: &DriverEvent) {
        match event {
            DriverEvent::Batch { outcome, progress } => {
                let style = AnsiColor::Green.on_default();
                info!(
                    "{style}{}/{}{style:#} ({}) restored {} of {} in batch",
                    progress.processed,
                    progress.total,
                    format_percent(progress.percent),
                    outcome.restored,
                    outcome.total,
                );
            }
            DriverEvent::Paused(progress) => {
                info!(
                    "paused with {} of {} items left; run `resume` to continue",
                    progress.remaining, progress.total
                );
            }
            DriverEvent::Completed(_) | DriverEvent::Canceled => {}
        }
    }
}

pub fn create_driver(service: &Arc<RestoreService>, args: &DriverArgs) -> Arc<Driver> {
    let config = DriverConfig {
        batch_size: BATCH_SIZE,
        checkpoint_interval: args.checkpoint_interval,
        max_consecutive_failures: args.max_failures,
    };
    let driver = Driver::new(service.clone(), service.queue_store(), config)
        .with_observer(Arc::new(LogObserver));
    Arc::new(driver)
}

/// Runs `driver` to the end. An interrupt pauses it and waits for the
/// in-flight batch, so the saved queue reflects every finished batch.
pub async fn run_driver(driver: Arc<Driver>) -> Result<DriverStatus> {
    let mut task = spawn({
        let driver = driver.clone();
        async move { driver.run().await }
    });

    tokio::select! {
        result = &mut task => result?,
        signal = ctrl_c() => {
            signal?;
            warn!("interrupted, finishing current batch");
            driver.pause().await?;
            task.await?
        }
    }
}

/// Reports the end of a run over `contexts` and drops their cached stats.
pub async fn finish(
    service: &RestoreService,
    driver: &Driver,
    status: DriverStatus,
    contexts: &BTreeSet<Context>,
    show_stats: bool,
    stats: CommandStats,
) -> Result<()> {
    if status == DriverStatus::Completed {
        for context in contexts {
            service.invalidate_stats(*context).await?;
        }

        let result = service.get_result().await?;
        let style = AnsiColor::Green.on_default();
        info!(
            "{style}restore complete:{style:#} {} restored, {} failed",
            result.restored, result.failed
        );
    }

    if show_stats {
        let summary = driver.summary().await;
        let stats = CommandStats {
            items_processed: summary.processed,
            items_failed: summary.errors,
            batches: summary.batches,
            checkpoints: summary.checkpoints,
            ..stats
        }
        .finalize(service.storage_stats());

        print_stat("items processed", stats.items_processed);
        print_stat("items failed", stats.items_failed);
        print_stat("batches", stats.batches);
        print_stat("checkpoints", stats.checkpoints);
        print_stat("state read", format_size(stats.storage.bytes_downloaded));
        print_stat("state written", format_size(stats.storage.bytes_uploaded));
        print_stat("elapsed time", format_duration(stats.elapsed_time()));
    }

    Ok(())
}
