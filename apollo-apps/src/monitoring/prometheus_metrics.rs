//! Prometheus gauges mirroring the dashboard snapshot.

use prometheus::{Gauge, IntCounter, IntCounterVec, Opts, Registry};

#[derive(Clone)]
pub struct PrometheusMetrics {
    pub registry: Registry,
    pub panel_uptime_seconds: Gauge,
    /// 1 when the backend link is up, 0 otherwise
    pub panel_backend_connected: Gauge,
    pub panel_throughput_kbps: Gauge,
    pub panel_throughput_peak_kbps: Gauge,
    pub panel_throughput_samples: Gauge,
    pub panel_alerts_buffered: Gauge,
    pub panel_frames_total: IntCounterVec,
    pub panel_reconnects_total: IntCounter,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let panel_uptime_seconds = Gauge::new(
            "panel_uptime_seconds",
            "Seconds since the monitoring server started",
        )?;
        registry.register(Box::new(panel_uptime_seconds.clone()))?;

        let panel_backend_connected = Gauge::new(
            "panel_backend_connected",
            "Whether the backend WebSocket is connected",
        )?;
        registry.register(Box::new(panel_backend_connected.clone()))?;

        let panel_throughput_kbps = Gauge::new(
            "panel_throughput_kbps",
            "Most recent throughput sample in Kbps",
        )?;
        registry.register(Box::new(panel_throughput_kbps.clone()))?;

        let panel_throughput_peak_kbps = Gauge::new(
            "panel_throughput_peak_kbps",
            "Highest throughput in the current window in Kbps",
        )?;
        registry.register(Box::new(panel_throughput_peak_kbps.clone()))?;

        let panel_throughput_samples = Gauge::new(
            "panel_throughput_samples",
            "Samples currently held in the throughput window",
        )?;
        registry.register(Box::new(panel_throughput_samples.clone()))?;

        let panel_alerts_buffered = Gauge::new(
            "panel_alerts_buffered",
            "Alerts currently held in the alert log",
        )?;
        registry.register(Box::new(panel_alerts_buffered.clone()))?;

        let panel_frames_total = IntCounterVec::new(
            Opts::new("panel_frames_total", "Frames received from the backend by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(panel_frames_total.clone()))?;

        let panel_reconnects_total = IntCounter::new(
            "panel_reconnects_total",
            "Reconnect attempts scheduled after the backend link dropped",
        )?;
        registry.register(Box::new(panel_reconnects_total.clone()))?;

        Ok(Self {
            registry,
            panel_uptime_seconds,
            panel_backend_connected,
            panel_throughput_kbps,
            panel_throughput_peak_kbps,
            panel_throughput_samples,
            panel_alerts_buffered,
            panel_frames_total,
            panel_reconnects_total,
        })
    }
}

/// Advances a counter to an absolute `value` taken from a snapshot.
///
/// Counters never go backwards, so a lower value is ignored.
pub fn sync_counter(counter: &IntCounter, value: u64) {
    let current = counter.get();
    if value > current {
        counter.inc_by(value - current);
    }
}
