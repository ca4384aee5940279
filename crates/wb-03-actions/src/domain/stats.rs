use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters of the action store.
#[derive(Debug, Default)]
pub struct ActionStats {
    pub created: AtomicU64,
    pub approved: AtomicU64,
    pub rejected: AtomicU64,
    pub expired: AtomicU64,
    /// Terminal responses the sink could not write.
    pub undelivered: AtomicU64,
}

impl ActionStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
