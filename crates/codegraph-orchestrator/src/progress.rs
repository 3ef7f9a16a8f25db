//! Progress reporter (spec §4.9): a monotonically non-decreasing percentage
//! with a rolling ETA based on processed-bytes-per-second.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct ProgressReporter {
    total_bytes: u64,
    processed_bytes: AtomicU64,
    started_at: Instant,
}

impl ProgressReporter {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            processed_bytes: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Record that `bytes` more have been processed. Monotonic by
    /// construction since it only ever adds.
    pub fn advance(&self, bytes: u64) {
        self.processed_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        let processed = self.processed_bytes.load(Ordering::Relaxed);
        ((processed as f64 / self.total_bytes as f64) * 100.0).min(100.0)
    }

    /// Remaining time estimate from the rolling processed-bytes-per-second
    /// rate, `None` until at least one byte has been processed.
    pub fn eta(&self) -> Option<std::time::Duration> {
        let processed = self.processed_bytes.load(Ordering::Relaxed);
        if processed == 0 {
            return None;
        }
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }
        let rate = processed as f64 / elapsed;
        if rate <= 0.0 {
            return None;
        }
        let remaining_bytes = self.total_bytes.saturating_sub(processed) as f64;
        Some(std::time::Duration::from_secs_f64(remaining_bytes / rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_monotonic_and_capped_at_100() {
        let reporter = ProgressReporter::new(100);
        assert_eq!(reporter.percent(), 0.0);
        reporter.advance(50);
        assert_eq!(reporter.percent(), 50.0);
        reporter.advance(100);
        assert_eq!(reporter.percent(), 100.0);
    }

    #[test]
    fn zero_total_bytes_reports_complete() {
        let reporter = ProgressReporter::new(0);
        assert_eq!(reporter.percent(), 100.0);
    }

    #[test]
    fn eta_is_none_before_any_progress() {
        let reporter = ProgressReporter::new(1000);
        assert!(reporter.eta().is_none());
    }
}
