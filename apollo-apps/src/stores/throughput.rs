//! Rolling throughput series.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{message::RawSample, time_fmt::clock_label};

/// Number of samples kept when no other capacity is configured.
pub const DEFAULT_THROUGHPUT_HISTORY_LEN: usize = 60;

/// One point on the throughput chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSample {
    /// Window start, epoch seconds.
    pub timestamp: i64,
    /// Local clock-time label for the x axis.
    pub label: String,
    pub value_kbps: f64,
}

impl ThroughputSample {
    /// Builds a chart point from a raw backend sample.
    pub fn from_raw(timestamp: i64, raw: &RawSample) -> Self {
        Self {
            timestamp,
            label: clock_label(timestamp),
            value_kbps: bytes_to_kbps(raw.bytes_total.unwrap_or(0.0)),
        }
    }

    /// Value rounded to two decimals, as displayed.
    pub fn display_value(&self) -> String {
        format!("{:.2}", self.value_kbps)
    }
}

/// Kilobits per second for a one-second window of `bytes`.
pub fn bytes_to_kbps(bytes: f64) -> f64 {
    bytes * 8.0 / 1024.0
}

/// Fixed-capacity FIFO of throughput samples, oldest first.
#[derive(Debug, Clone)]
pub struct ThroughputSeries {
    samples: VecDeque<ThroughputSample>,
    capacity: usize,
}

impl Default for ThroughputSeries {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_THROUGHPUT_HISTORY_LEN)
    }
}

impl ThroughputSeries {
    /// Creates an empty series. A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample and evicts from the front until the series fits its capacity.
    pub fn append(&mut self, timestamp: i64, raw: &RawSample) -> &ThroughputSample {
        self.samples
            .push_back(ThroughputSample::from_raw(timestamp, raw));
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        // Just pushed, so the series is never empty here.
        &self.samples[self.samples.len() - 1]
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThroughputSample> {
        self.samples.iter()
    }

    /// X-axis labels, oldest first.
    pub fn labels(&self) -> Vec<String> {
        self.samples.iter().map(|s| s.label.clone()).collect()
    }

    /// Values in Kbps, parallel to [`Self::labels`].
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value_kbps).collect()
    }

    /// Values formatted with two decimals, parallel to [`Self::labels`].
    pub fn display_values(&self) -> Vec<String> {
        self.samples.iter().map(|s| s.display_value()).collect()
    }

    pub fn latest(&self) -> Option<&ThroughputSample> {
        self.samples.back()
    }

    /// Highest value currently in the window, zero when empty.
    pub fn peak_kbps(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.value_kbps)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(bytes: Option<f64>) -> RawSample {
        RawSample {
            bytes_total: bytes,
            packets: None,
        }
    }

    #[test]
    fn test_kbps_conversion() {
        let sample = ThroughputSample::from_raw(0, &raw(Some(1024.0)));
        assert_eq!(sample.value_kbps, 8.0);
        assert_eq!(sample.display_value(), "8.00");
    }

    #[test]
    fn test_missing_bytes_is_zero() {
        let sample = ThroughputSample::from_raw(0, &raw(None));
        assert_eq!(sample.value_kbps, 0.0);
        assert_eq!(sample.display_value(), "0.00");
    }

    #[test]
    fn test_display_rounds_to_two_decimals() {
        // 1000 bytes -> 7.8125 Kbps
        let sample = ThroughputSample::from_raw(0, &raw(Some(1000.0)));
        assert_eq!(sample.display_value(), "7.81");
    }

    #[test]
    fn test_series_keeps_min_capacity_n() {
        for n in [0usize, 1, 59, 60, 61, 200] {
            let mut series = ThroughputSeries::default();
            for i in 0..n {
                series.append(i as i64, &raw(Some(i as f64)));
            }
            assert_eq!(series.len(), n.min(DEFAULT_THROUGHPUT_HISTORY_LEN));
            if n > 0 {
                assert_eq!(series.latest().unwrap().timestamp, n as i64 - 1);
                let first = series.iter().next().unwrap().timestamp;
                assert_eq!(first, n.saturating_sub(DEFAULT_THROUGHPUT_HISTORY_LEN) as i64);
            }
        }
    }

    #[test]
    fn test_sixty_five_samples_evict_first_five() {
        let base = 1_700_000_000;
        let mut series = ThroughputSeries::default();
        for i in 0..65 {
            series.append(base + i, &raw(Some(1024.0)));
        }
        assert_eq!(series.len(), 60);
        assert_eq!(series.labels()[0], clock_label(base + 5));
        assert_eq!(series.iter().next().unwrap().timestamp, base + 5);
    }

    #[test]
    fn test_labels_and_values_are_parallel() {
        let mut series = ThroughputSeries::with_capacity(3);
        series.append(10, &raw(Some(128.0)));
        series.append(11, &raw(Some(256.0)));
        assert_eq!(series.labels().len(), series.values().len());
        assert_eq!(series.values(), vec![1.0, 2.0]);
        assert_eq!(series.display_values(), vec!["1.00", "2.00"]);
        assert_eq!(series.peak_kbps(), 2.0);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut series = ThroughputSeries::with_capacity(0);
        series.append(1, &raw(Some(1.0)));
        series.append(2, &raw(Some(2.0)));
        assert_eq!(series.capacity(), 1);
        assert_eq!(series.len(), 1);
        assert_eq!(series.latest().unwrap().timestamp, 2);
    }
}
