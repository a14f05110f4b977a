mod args;
mod cache;
mod drive;
mod parse;
mod progress;
mod queue;
mod restore;
mod resume;
mod stats;
mod storage;

use std::{fmt::Display, process::ExitCode};

use clap::{
    builder::{styling::AnsiColor, Styles},
    Parser, Subcommand,
};
use log::{error, info};

use crate::logger;

use self::args::{
    ClearCacheArgs, ClearQueueArgs, GlobalArgs, ProgressArgs, QueueArgs, RestoreAllArgs,
    RestoreArgs, ResumeArgs, StatsArgs,
};

/// Restores optimized media from their original backups, in resumable batches.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, propagate_version = true, styles = cli_styles())]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Restore every backed-up item of one collection
    Restore(RestoreArgs),

    /// Restore every available collection in one run
    RestoreAll(RestoreAllArgs),

    /// Continue an interrupted restore
    Resume(ResumeArgs),

    /// Show size statistics per collection
    Stats(StatsArgs),

    /// Show progress of the current run
    Progress(ProgressArgs),

    /// Show the saved restore queue
    Queue(QueueArgs),

    /// Delete the saved restore queue
    ClearQueue(ClearQueueArgs),

    /// Delete run state and cached lists and stats
    ClearCache(ClearCacheArgs),
}

impl Command {
    fn global(&self) -> &GlobalArgs {
        match self {
            Command::Restore(args) => &args.global,
            Command::RestoreAll(args) => &args.global,
            Command::Resume(args) => &args.global,
            Command::Stats(args) => &args.global,
            Command::Progress(args) => &args.global,
            Command::Queue(args) => &args.global,
            Command::ClearQueue(args) => &args.global,
            Command::ClearCache(args) => &args.global,
        }
    }
}

pub async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.command.global());

    let result = match cli.command {
        Command::Restore(args) => restore::main(args).await,
        Command::RestoreAll(args) => restore::main_all(args).await,
        Command::Resume(args) => resume::main(args).await,
        Command::Stats(args) => stats::main(args).await,
        Command::Progress(args) => progress::main(args).await,
        Command::Queue(args) => queue::main(args).await,
        Command::ClearQueue(args) => queue::clear(args).await,
        Command::ClearCache(args) => cache::clear(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logger(args: &GlobalArgs) {
    let level = logger::level_from_counts(args.logger.verbose, args.logger.quiet);
    logger::init(level, args.logger.color);
}

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightMagenta.on_default())
        .usage(AnsiColor::BrightMagenta.on_default())
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightCyan.on_default())
}

fn print_stat<T: Display>(name: &str, value: T) {
    let style = AnsiColor::BrightBlack.on_default();
    info!("{style}{name}:{style:#} {value}");
}
