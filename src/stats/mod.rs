mod command;


use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    host::{SharedCatalog, SizeRecord},
    job::Context,
    keys,
    storage::TransientStore,
};

pub use command::CommandStats;

/// Number of size records read for an extrapolated estimate.
pub const SIZE_SAMPLE: usize = 100;

pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextStats {
    pub total_items: u64,
    pub original_size: u64,
    pub optimized_size: u64,
    pub saved_size: u64,
    pub percent_saved: f64,
    /// Sizes were extrapolated from a sample and are not exact.
    pub approximate: bool,
}

impl ContextStats {
    pub fn new(total_items: u64, original_size: u64, optimized_size: u64) -> Self {
        let saved_size = original_size.saturating_sub(optimized_size);
        ContextStats {
            total_items,
            original_size,
            optimized_size,
            saved_size,
            percent_saved: percent_of(saved_size, original_size),
            approximate: false,
        }
    }

    /// Sums several snapshots into one.
    pub fn combine<'a, I: IntoIterator<Item = &'a ContextStats>>(stats: I) -> Self {
        let mut total_items = 0;
        let mut original_size = 0;
        let mut optimized_size = 0;
        let mut approximate = false;

        for stats in stats {
            total_items += stats.total_items;
            original_size += stats.original_size;
            optimized_size += stats.optimized_size;
            approximate |= stats.approximate;
        }

        ContextStats {
            approximate,
            ..ContextStats::new(total_items, original_size, optimized_size)
        }
    }
}

/// `part / whole` as a percentage rounded to two decimals, or 0 for an empty whole.
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let percent = part as f64 / whole as f64 * 100.0;
    (percent * 100.0).round() / 100.0
}

#[derive(Debug, Clone)]
pub struct StatsAggregator {
    catalog: SharedCatalog,
    store: TransientStore,
}

impl StatsAggregator {
    pub fn new(catalog: SharedCatalog, store: TransientStore) -> Self {
        StatsAggregator { catalog, store }
    }

    /// Size statistics for `context`, cached for [`CACHE_TTL`].
    ///
    /// The media library is usually large, so its sizes are summed over the
    /// first [`SIZE_SAMPLE`] items and scaled up to the full count. Custom
    /// folders are summed exactly.
    pub async fn stats(&self, context: Context) -> Result<ContextStats> {
        let cache_key = keys::cached_stats(context);
        if let Some(stats) = self.store.get(&cache_key).await? {
            return Ok(stats);
        }

        let total_items = self.catalog.count(context).await?;
        let stats = match context {
            Context::Primary => {
                let sample = self.catalog.sizes(context, Some(SIZE_SAMPLE)).await?;
                extrapolate(total_items, &sample)
            }
            Context::Secondary => {
                let sizes = self.catalog.sizes(context, None).await?;
                let (original, optimized) = sum_sizes(&sizes);
                ContextStats::new(total_items, original, optimized)
            }
        };

        self.store.set(&cache_key, &stats, CACHE_TTL).await?;
        Ok(stats)
    }

    pub async fn invalidate(&self, context: Context) -> Result<()> {
        self.store.delete(&keys::cached_stats(context)).await
    }
}

fn sum_sizes(sizes: &[SizeRecord]) -> (u64, u64) {
    sizes.iter().fold((0, 0), |(original, optimized), record| {
        (
            original + record.original_size,
            optimized + record.optimized_size,
        )
    })
}

fn extrapolate(total_items: u64, sample: &[SizeRecord]) -> ContextStats {
    let (original, optimized) = sum_sizes(sample);
    let sampled = sample.len() as u64;

    if sampled == 0 || total_items <= sampled {
        return ContextStats::new(total_items, original, optimized);
    }

    let scale = |size: u64| {
        let scaled = u128::from(size) * u128::from(total_items) / u128::from(sampled);
        u64::try_from(scaled).unwrap_or(u64::MAX)
    };

    ContextStats {
        approximate: true,
        ..ContextStats::new(total_items, scale(original), scale(optimized))
    }
}
