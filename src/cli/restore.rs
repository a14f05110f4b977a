use std::{
    collections::BTreeSet,
    io::{self, Write},
};

use clap::builder::styling::AnsiColor;
use log::{info, warn};
use tokio::io::{stdin, AsyncBufReadExt, BufReader};

use crate::{
    error::{Error, Result},
    format::{format_percent, format_size},
    job::Context,
    service::RestoreService,
    stats::{CommandStats, ContextStats},
};

use super::{
    args::{GlobalArgs, RestoreAllArgs, RestoreArgs, RunArgs},
    drive::{create_driver, finish, run_driver},
    storage::create_service,
};

pub async fn main(cli: RestoreArgs) -> Result<()> {
    restore(&[cli.context], false, &cli.run, &cli.global).await
}

pub async fn main_all(cli: RestoreAllArgs) -> Result<()> {
    restore(&Context::ALL, true, &cli.run, &cli.global).await
}

/// With `skip_missing`, contexts that are unavailable or have nothing to
/// restore are left out instead of failing the command.
async fn restore(
    contexts: &[Context],
    skip_missing: bool,
    run: &RunArgs,
    global: &GlobalArgs,
) -> Result<()> {
    let stats = CommandStats::new();
    let service = create_service(global, run.driver.tasks)?;

    if let Ok(queue) = service.get_queue().await {
        warn!(
            "replacing an unfinished restore with {} of {} items left",
            queue.remaining(),
            queue.total
        );
    }

    let mut selected = vec![];
    for &context in contexts {
        if !service.is_available(context).await? {
            if skip_missing {
                info!("{context} is not available, skipping");
                continue;
            }

            return Err(Error::ContextUnavailable(context));
        }

        print_summary(&service, context).await?;
        selected.push(context);
    }

    if run.dry_run {
        info!("dry run, nothing was restored");
        return Ok(());
    }

    if selected.is_empty() {
        info!("nothing to restore");
        return Ok(());
    }

    let prompt = "Restore original files? This discards the optimized versions.";
    if !run.yes && !confirm(prompt).await? {
        info!("aborted");
        return Ok(());
    }

    let mut jobs = vec![];
    let mut started = BTreeSet::new();
    for context in selected {
        match service.start_restore(context).await {
            Ok(plan) => {
                jobs.extend(plan.jobs);
                started.insert(context);
            }
            Err(Error::NothingToRestore(_)) if skip_missing => {
                info!("no images to restore in {context}, skipping");
            }
            Err(err) => return Err(err),
        }
    }

    if jobs.is_empty() {
        info!("nothing to restore");
        return Ok(());
    }

    let driver = create_driver(&service, &run.driver);
    driver.start(jobs).await?;
    let status = run_driver(driver.clone()).await?;

    finish(&service, &driver, status, &started, global.stats, stats).await
}

async fn print_summary(service: &RestoreService, context: Context) -> Result<()> {
    let stats = service.get_stats(context).await?;
    let style = AnsiColor::BrightBlue.on_default();
    info!("{style}{context}{style:#}: {}", describe(&stats));
    Ok(())
}

/// Counts come from the stats, which cover every item rather than a
/// capped preview.
fn describe(stats: &ContextStats) -> String {
    let marker = if stats.approximate { "~" } else { "" };
    format!(
        "{} restorable items, {marker}{} saved ({marker}{})",
        stats.total_items,
        format_size(stats.saved_size),
        format_percent(stats.percent_saved),
    )
}

async fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    BufReader::new(stdin()).read_line(&mut answer).await?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
