//! Series allocation statistics.
//!
//! This evaluator is single-threaded cooperative, so unlike a cross-thread
//! arena registry this is a single global counter pair with a CAS-loop
//! high-water mark -- the same peak-tracking idiom, just without the
//! per-thread slot table a multi-threaded host would need.

use std::sync::atomic::{AtomicU64, Ordering};

static SERIES_BYTES: AtomicU64 = AtomicU64::new(0);
static PEAK_SERIES_BYTES: AtomicU64 = AtomicU64::new(0);
static SERIES_ALIVE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesStats {
    pub bytes: u64,
    pub peak_bytes: u64,
    pub series_alive: u64,
}

pub fn record_alloc(bytes: usize) {
    let bytes = bytes as u64;
    let new_total = SERIES_BYTES.fetch_add(bytes, Ordering::Relaxed) + bytes;
    SERIES_ALIVE.fetch_add(1, Ordering::Relaxed);

    let mut peak = PEAK_SERIES_BYTES.load(Ordering::Relaxed);
    while new_total > peak {
        match PEAK_SERIES_BYTES.compare_exchange_weak(
            peak,
            new_total,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(current) => peak = current,
        }
    }
}

pub fn record_free(bytes: usize) {
    SERIES_BYTES.fetch_sub(bytes as u64, Ordering::Relaxed);
    SERIES_ALIVE.fetch_sub(1, Ordering::Relaxed);
}

pub fn series_stats() -> SeriesStats {
    SeriesStats {
        bytes: SERIES_BYTES.load(Ordering::Relaxed),
        peak_bytes: PEAK_SERIES_BYTES.load(Ordering::Relaxed),
        series_alive: SERIES_ALIVE.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_tracks_high_water_mark() {
        let before = series_stats().peak_bytes;
        record_alloc(100);
        record_alloc(50);
        assert!(series_stats().peak_bytes >= before + 150);
        record_free(100);
        record_free(50);
        // peak does not decrease on free
        assert!(series_stats().peak_bytes >= before + 150);
    }
}
