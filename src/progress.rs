use serde::{Deserialize, Serialize};

use crate::stats::percent_of;

/// Live counters of one context in an in-progress run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub total: u64,
    pub remaining: u64,
}

impl RunState {
    pub fn new(total: u64) -> Self {
        RunState {
            total,
            remaining: total,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub is_running: bool,
    pub is_complete: bool,
    pub total: u64,
    pub remaining: u64,
    pub processed: u64,
    pub percent: f64,
}

impl Progress {
    /// Aggregates the run states of every active context.
    ///
    /// Finished contexts have no state left, so once every context is done
    /// the counters are derived from the completion flag alone.
    pub fn from_states<'a, I>(states: I, is_complete: bool) -> Self
    where
        I: IntoIterator<Item = &'a RunState>,
    {
        let (total, remaining) = states.into_iter().fold((0, 0), |(total, remaining), state| {
            (total + state.total, remaining + state.remaining)
        });

        if total == 0 {
            return Progress {
                is_complete,
                percent: if is_complete { 100.0 } else { 0.0 },
                ..Progress::default()
            };
        }

        let processed = total.saturating_sub(remaining);
        Progress {
            is_running: !is_complete,
            is_complete,
            total,
            remaining,
            processed,
            percent: percent_of(processed, total),
        }
    }

    /// Progress of a single queue as seen by whoever drives it.
    pub fn from_counts(total: u64, processed: u64) -> Self {
        let remaining = total.saturating_sub(processed);
        Progress {
            is_running: remaining > 0,
            is_complete: total > 0 && remaining == 0,
            total,
            remaining,
            processed,
            percent: percent_of(processed.min(total), total),
        }
    }
}
