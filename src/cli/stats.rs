use std::collections::BTreeMap;

use clap::builder::styling::AnsiColor;
use log::info;
use serde::Serialize;

use crate::{
    error::Result,
    format::{format_percent, format_size},
    job::Context,
    stats::ContextStats,
};

use super::{
    args::{OutputFormat, StatsArgs},
    storage::create_service,
};

#[derive(Debug, Serialize)]
struct StatsReport {
    contexts: BTreeMap<&'static str, ContextStats>,
    total: ContextStats,
}

pub async fn main(cli: StatsArgs) -> Result<()> {
    let service = create_service(&cli.global, 1)?;
    let contexts = match cli.context {
        Some(context) => vec![context],
        None => Context::ALL.to_vec(),
    };

    let mut rows = vec![];
    for context in contexts {
        if service.is_available(context).await? {
            rows.push((context, service.get_stats(context).await?));
        }
    }

    let total = ContextStats::combine(rows.iter().map(|(_, stats)| stats));
    match cli.format {
        OutputFormat::Table => print_table(&rows, &total),
        OutputFormat::Json => {
            let report = StatsReport {
                contexts: rows
                    .into_iter()
                    .map(|(context, stats)| (context.slug(), stats))
                    .collect(),
                total,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn print_table(rows: &[(Context, ContextStats)], total: &ContextStats) {
    let style = AnsiColor::BrightMagenta.on_default();
    info!(
        "{style}{:<16} {:>8} {:>12} {:>12} {:>12} {:>8}{style:#}",
        "collection", "items", "original", "optimized", "saved", "saved %"
    );

    for (context, stats) in rows {
        print_row(context.label(), stats);
    }

    if rows.len() > 1 {
        print_row("Total", total);
    }
}

fn print_row(name: &str, stats: &ContextStats) {
    let marker = if stats.approximate { "~" } else { "" };
    info!(
        "{:<16} {:>8} {:>12} {:>12} {:>12} {:>8}",
        name,
        stats.total_items,
        format!("{marker}{}", format_size(stats.original_size)),
        format!("{marker}{}", format_size(stats.optimized_size)),
        format!("{marker}{}", format_size(stats.saved_size)),
        format_percent(stats.percent_saved),
    );
}
