use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility.
#[derive(Clone, Default)]
pub struct Counters {
    pub updates: Arc<AtomicU64>,

    pub renames_ok: Arc<AtomicU64>,
    pub renames_failed: Arc<AtomicU64>,

    // skip reasons
    pub targets_unresolved: Arc<AtomicU64>,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            updates: self.updates.load(Ordering::Relaxed),
            renames_ok: self.renames_ok.load(Ordering::Relaxed),
            renames_failed: self.renames_failed.load(Ordering::Relaxed),
            targets_unresolved: self.targets_unresolved.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub updates: u64,
    pub renames_ok: u64,
    pub renames_failed: u64,
    pub targets_unresolved: u64,
}
