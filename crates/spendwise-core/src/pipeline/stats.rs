//! Processing counters

use std::sync::Mutex;

use super::types::ProcessingStats;

#[derive(Debug, Default)]
pub struct StatsTracker {
    inner: Mutex<ProcessingStats>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished item; latency feeds a cumulative moving average
    pub fn record(&self, success: bool, latency_ms: f64) {
        let mut stats = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        stats.total_processed += 1;
        if success {
            stats.successful += 1;
        } else {
            stats.failed += 1;
        }
        let n = stats.total_processed as f64;
        stats.average_latency_ms += (latency_ms - stats.average_latency_ms) / n;
    }

    pub fn snapshot(&self) -> ProcessingStats {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average() {
        let tracker = StatsTracker::new();
        tracker.record(true, 10.0);
        tracker.record(false, 20.0);
        tracker.record(true, 30.0);

        let stats = tracker.snapshot();
        assert_eq!(stats.total_processed, 3);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.average_latency_ms, 20.0);
    }
}
