//! Level push/drop balance counters: every pushed level should eventually
//! be dropped exactly once, and these atomics make that checkable from
//! outside the trampoline itself.
//!
//! Grounded on the strand-registry counter pattern used for scheduler
//! bookkeeping elsewhere in this codebase: global atomics plus a
//! CAS-loop high-water mark, sized here for a single-threaded evaluator
//! rather than a cross-thread scheduler.

use std::sync::atomic::{AtomicU64, Ordering};

static LEVELS_PUSHED: AtomicU64 = AtomicU64::new(0);
static LEVELS_DROPPED: AtomicU64 = AtomicU64::new(0);
static PEAK_DEPTH: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStats {
    pub pushed: u64,
    pub dropped: u64,
    pub depth: u64,
    pub peak_depth: u64,
}

pub fn record_push() {
    LEVELS_PUSHED.fetch_add(1, Ordering::Relaxed);
    let depth = LEVELS_PUSHED.load(Ordering::Relaxed) - LEVELS_DROPPED.load(Ordering::Relaxed);
    let mut peak = PEAK_DEPTH.load(Ordering::Relaxed);
    while depth > peak {
        match PEAK_DEPTH.compare_exchange_weak(peak, depth, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(current) => peak = current,
        }
    }
}

pub fn record_drop() {
    LEVELS_DROPPED.fetch_add(1, Ordering::Relaxed);
}

pub fn level_stats() -> LevelStats {
    let pushed = LEVELS_PUSHED.load(Ordering::Relaxed);
    let dropped = LEVELS_DROPPED.load(Ordering::Relaxed);
    LevelStats {
        pushed,
        dropped,
        depth: pushed.saturating_sub(dropped),
        peak_depth: PEAK_DEPTH.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_push_and_drop_returns_to_zero_depth() {
        let before = level_stats();
        record_push();
        record_push();
        record_drop();
        record_drop();
        let after = level_stats();
        assert_eq!(after.pushed - before.pushed, 2);
        assert_eq!(after.dropped - before.dropped, 2);
        assert_eq!(after.depth, before.depth);
    }
}
