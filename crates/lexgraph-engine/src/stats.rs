//! Process-wide request counters.
//!
//! The only shared mutable state across requests. Owned by the hosting
//! service and injected into the pipeline; all updates are atomic and
//! monotonic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Atomically updated aggregate counters.
#[derive(Debug, Default)]
pub struct EngineStats {
    queries: AtomicU64,
    degraded: AtomicU64,
    blocked: AtomicU64,
    flagged_for_review: AtomicU64,
    total_processing_micros: AtomicU64,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub queries: u64,
    pub degraded: u64,
    pub blocked: u64,
    pub flagged_for_review: u64,
    pub total_processing_micros: u64,
    pub average_processing_micros: u64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed request.
    pub fn record(&self, elapsed: Duration, degraded: bool, blocked: bool, review: bool) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if degraded {
            self.degraded.fetch_add(1, Ordering::Relaxed);
        }
        if blocked {
            self.blocked.fetch_add(1, Ordering::Relaxed);
        }
        if review {
            self.flagged_for_review.fetch_add(1, Ordering::Relaxed);
        }
        self.total_processing_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let queries = self.queries.load(Ordering::Relaxed);
        let total = self.total_processing_micros.load(Ordering::Relaxed);
        StatsSnapshot {
            queries,
            degraded: self.degraded.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            flagged_for_review: self.flagged_for_review.load(Ordering::Relaxed),
            total_processing_micros: total,
            average_processing_micros: if queries == 0 { 0 } else { total / queries },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn record_accumulates() {
        let stats = EngineStats::new();
        stats.record(Duration::from_micros(100), false, false, false);
        stats.record(Duration::from_micros(300), true, true, true);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.queries, 2);
        assert_eq!(snapshot.degraded, 1);
        assert_eq!(snapshot.blocked, 1);
        assert_eq!(snapshot.flagged_for_review, 1);
        assert_eq!(snapshot.total_processing_micros, 400);
        assert_eq!(snapshot.average_processing_micros, 200);
    }

    #[test]
    fn empty_snapshot_has_zero_average() {
        assert_eq!(EngineStats::new().snapshot().average_processing_micros, 0);
    }

    #[test]
    fn concurrent_updates_are_lossless() {
        let stats = Arc::new(EngineStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record(Duration::from_micros(1), true, false, false);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.queries, 8000);
        assert_eq!(snapshot.degraded, 8000);
        assert_eq!(snapshot.total_processing_micros, 8000);
    }
}
