//! Per-call latency measurement.

use std::time::{Duration, Instant};

/// Run `f` and measure it with the monotonic clock.
#[inline]
pub fn timed<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed())
}

/// Duration as fractional milliseconds.
#[inline]
pub fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Aggregated latency of the calls made by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    /// Number of calls.
    pub count: u64,
    /// Sum of per-call durations.
    pub total: Duration,
    /// Fastest call.
    pub min: Duration,
    /// Slowest call.
    pub max: Duration,
}

impl CallStats {
    /// Record one call.
    pub fn record(&mut self, elapsed: Duration) {
        if self.count == 0 || elapsed < self.min {
            self.min = elapsed;
        }
        self.max = self.max.max(elapsed);
        self.total += elapsed;
        self.count += 1;
    }

    /// Mean call duration, zero when nothing was recorded.
    #[must_use]
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total.as_nanos() / u128::from(self.count);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_stats() {
        let stats = CallStats::default();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean(), Duration::ZERO);
        assert_eq!(stats.min, Duration::ZERO);
    }

    #[test]
    fn records_extremes_and_mean() {
        let mut stats = CallStats::default();
        for micros in [40, 10, 70] {
            stats.record(Duration::from_micros(micros));
        }
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, Duration::from_micros(10));
        assert_eq!(stats.max, Duration::from_micros(70));
        assert_eq!(stats.total, Duration::from_micros(120));
        assert_eq!(stats.mean(), Duration::from_micros(40));
    }

    #[test]
    fn millis_conversion() {
        assert_relative_eq!(millis(Duration::from_micros(1500)), 1.5);
        assert_relative_eq!(millis(Duration::from_nanos(1)), 1e-6, max_relative = 1e-12);
    }

    #[test]
    fn clock_is_monotonic() {
        let first = Instant::now();
        let ((), elapsed) = timed(|| std::hint::black_box(()));
        assert!(Instant::now() >= first);
        assert!(elapsed <= first.elapsed());
    }
}
