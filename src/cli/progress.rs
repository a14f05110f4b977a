use log::info;
use serde::Serialize;

use crate::{
    error::Result,
    format::format_percent,
    progress::Progress,
    run_state::RunResult,
};

use super::{
    args::{OutputFormat, ProgressArgs},
    storage::create_service,
};

#[derive(Debug, Serialize)]
struct ProgressReport {
    #[serde(flatten)]
    progress: Progress,
    restored: u64,
    failed: u64,
}

pub async fn main(cli: ProgressArgs) -> Result<()> {
    let service = create_service(&cli.global, 1)?;
    let progress = service.get_progress().await?;
    let RunResult { restored, failed } = service.get_result().await?;

    match cli.format {
        OutputFormat::Table => print_progress(&progress, restored, failed),
        OutputFormat::Json => {
            let report = ProgressReport {
                progress: progress.clone(),
                restored,
                failed,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if cli.clear && progress.is_complete {
        service.clear_complete_flag().await?;
        info!("cleared finished run");
    }

    Ok(())
}

fn print_progress(progress: &Progress, restored: u64, failed: u64) {
    if progress.is_complete {
        info!("restore complete: {restored} restored, {failed} failed");
    } else if progress.is_running {
        info!(
            "restoring: {}/{} ({}), {} remaining",
            progress.processed,
            progress.total,
            format_percent(progress.percent),
            progress.remaining
        );
    } else {
        info!("no restore running");
    }
}
