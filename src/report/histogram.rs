use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;
use tracing::warn;

/// Significant figures kept by the latency histogram.
const HISTOGRAM_SIGFIG: u8 = 3;

/// Request latencies recorded in microseconds.
#[derive(Debug)]
pub struct LatencyHistogram {
    hist: Histogram<u64>,
    sum_us: u128,
}

impl LatencyHistogram {
    /// Create a new latency histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> Result<Self, String> {
        let hist = Histogram::<u64>::new(HISTOGRAM_SIGFIG)
            .map_err(|err| format!("Failed to create histogram: {}", err))?;
        Ok(Self { hist, sum_us: 0 })
    }

    /// Record one request latency.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub fn record(&mut self, latency: Duration) -> Result<(), String> {
        let value = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX).max(1);
        self.hist
            .record(value)
            .map_err(|err| format!("Failed to record latency: {}", err))?;
        self.sum_us = self.sum_us.saturating_add(u128::from(value));
        Ok(())
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }

    #[must_use]
    pub fn summary(&self) -> LatencySummary {
        let count = self.count();
        if count == 0 {
            return LatencySummary::default();
        }
        let mean_us = self
            .sum_us
            .checked_div(u128::from(count))
            .and_then(|mean| u64::try_from(mean).ok())
            .unwrap_or(u64::MAX);
        LatencySummary {
            count,
            min_us: self.hist.min(),
            max_us: self.hist.max(),
            mean_us,
            p50_us: self.hist.value_at_quantile(0.5),
            p90_us: self.hist.value_at_quantile(0.9),
            p99_us: self.hist.value_at_quantile(0.99),
        }
    }
}

/// Latency distribution of the requests that produced a timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p90_us: u64,
    pub p99_us: u64,
}

impl LatencySummary {
    #[must_use]
    pub fn from_durations<I>(durations: I) -> Self
    where
        I: IntoIterator<Item = Duration>,
    {
        let mut histogram = match LatencyHistogram::new() {
            Ok(histogram) => histogram,
            Err(err) => {
                warn!("{}", err);
                return Self::default();
            }
        };
        for duration in durations {
            if let Err(err) = histogram.record(duration) {
                warn!("{}", err);
            }
        }
        histogram.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_known_latencies() -> Result<(), String> {
        let summary = LatencySummary::from_durations(
            [10, 20, 30, 40].into_iter().map(Duration::from_millis),
        );
        if summary.count != 4 {
            return Err(format!("Unexpected count: {}", summary.count));
        }
        if summary.mean_us != 25_000 {
            return Err(format!("Unexpected mean: {}", summary.mean_us));
        }
        // Three significant figures: recorded values land within 0.1%.
        if !(9_990..=10_010).contains(&summary.min_us) || !(39_960..=40_040).contains(&summary.max_us)
        {
            return Err(format!(
                "Unexpected bounds: {}..{}",
                summary.min_us, summary.max_us
            ));
        }
        if summary.p50_us > summary.p90_us || summary.p90_us > summary.p99_us {
            return Err("Percentiles must be monotonic".to_owned());
        }
        Ok(())
    }

    #[test]
    fn empty_summary_is_zeroed() -> Result<(), String> {
        let summary = LatencySummary::from_durations(std::iter::empty());
        if summary != LatencySummary::default() {
            return Err(format!("Expected zeroed summary, got {:?}", summary));
        }
        Ok(())
    }
}
