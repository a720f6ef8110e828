//! Loop counters shared by the sampler and the control task.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct LoopStats {
    produced: AtomicU64,
    dropped: AtomicU64,
    consumed: AtomicU64,
}

/// Point-in-time copy of [`LoopStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Samples taken from the plant.
    pub produced: u64,
    /// Samples refused by a full channel.
    pub dropped: u64,
    /// Samples processed by the controller.
    pub consumed: u64,
}

impl LoopStats {
    pub const fn new() -> Self {
        Self {
            produced: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            consumed: AtomicU64::new(0),
        }
    }

    pub fn record_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_consumed(&self) {
        self.consumed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            produced: self.produced.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Samples that made it into the channel.
    pub fn queued_total(&self) -> u64 {
        self.produced.saturating_sub(self.dropped)
    }
}
