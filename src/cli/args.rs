use std::{ops::RangeInclusive, path::PathBuf, time::Duration};

use clap::{ArgAction, Args, ValueEnum};
use concolor_clap::ColorChoice;
use humantime::parse_duration;

use crate::{job::Context, storage::StorageUrl};

use super::parse::parse_range_inclusive;

const TASK_COUNT_RANGE: RangeInclusive<usize> = 1..=64;
const DEFAULT_TASK_COUNT: usize = 1;

const DEFAULT_CHECKPOINT_INTERVAL: &str = "5s";

const FAILURE_LIMIT_RANGE: RangeInclusive<u32> = 1..=1000;

fn parse_task_count(s: &str) -> Result<usize, String> {
    parse_range_inclusive(s, TASK_COUNT_RANGE)
}

fn parse_failure_limit(s: &str) -> Result<u32, String> {
    parse_range_inclusive(s, FAILURE_LIMIT_RANGE)
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    let interval = parse_duration(s).map_err(|err| err.to_string())?;
    if interval.is_zero() {
        Err("interval must be greater than zero".to_owned())
    } else {
        Ok(interval)
    }
}

fn parse_context(s: &str) -> Result<Context, String> {
    s.parse().map_err(|err: crate::error::Error| err.to_string())
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Collection to restore ('media' or 'folders')
    #[arg(value_parser = parse_context)]
    pub context: Context,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct RestoreAllArgs {
    #[command(flatten)]
    pub run: RunArgs,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct ResumeArgs {
    #[command(flatten)]
    pub driver: DriverArgs,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Don't ask for confirmation
    #[arg(short = 'y', long, default_value_t = false)]
    pub yes: bool,

    /// Show what would be restored without actually doing it
    #[arg(short = 'n', long, default_value_t = false)]
    pub dry_run: bool,

    #[command(flatten)]
    pub driver: DriverArgs,
}

#[derive(Args, Debug)]
pub struct DriverArgs {
    /// Number of restores to run concurrently within a batch
    #[arg(
        short = 'j',
        long,
        value_name = "NUM",
        default_value_t = DEFAULT_TASK_COUNT,
        value_parser = parse_task_count,
    )]
    pub tasks: usize,

    /// How often to save progress while a batch is running
    #[arg(
        long,
        value_name = "DURATION",
        default_value = DEFAULT_CHECKPOINT_INTERVAL,
        value_parser = parse_interval,
    )]
    pub checkpoint_interval: Duration,

    /// Pause after this many failed batches in a row
    #[arg(long, value_name = "NUM", value_parser = parse_failure_limit)]
    pub max_failures: Option<u32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Collection to show (all available collections if omitted)
    #[arg(value_parser = parse_context)]
    pub context: Option<Context>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct ProgressArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Acknowledge a finished run so its result is no longer reported
    #[arg(long, default_value_t = false)]
    pub clear: bool,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct QueueArgs {
    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct ClearQueueArgs {
    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct ClearCacheArgs {
    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// State backend (e.g. 'file://<path>' or 'memory://')
    #[arg(short, long, value_name = "URL")]
    pub storage: Option<StorageUrl>,

    /// Root directory of the media library
    #[arg(short = 'l', long, value_name = "PATH")]
    pub library: Option<PathBuf>,

    /// Add latency when using local storage
    #[arg(short = 'L', long, value_parser = parse_duration)]
    pub latency: Option<Duration>,

    /// Print stats after completion
    #[arg(long, default_value_t = false)]
    pub stats: bool,

    #[command(flatten)]
    pub logger: LoggerArgs,
}

#[derive(Args, Debug)]
pub struct LoggerArgs {
    /// When to use color in output
    #[arg(short, long, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Print more output
    #[arg(short, long, action = ArgAction::Count, group = "verbosity")]
    pub verbose: u8,

    /// Print less output
    #[arg(short, long, action = ArgAction::Count, group = "verbosity")]
    pub quiet: u8,
}
