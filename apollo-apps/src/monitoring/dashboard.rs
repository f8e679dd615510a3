//! Dashboard monitoring types
//!
//! These types describe what the panel is displaying: the link with the backend, the throughput
//! window and the alert log.

use serde::{Deserialize, Serialize};

use crate::{
    message::AlertRecord,
    state::{ConnectionState, DashboardState, DispatchCounters},
    stores::ThroughputSample,
};

/// Link status and frame counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub connection: ConnectionState,
    pub counters: DispatchCounters,
    pub throughput_samples: usize,
    pub alerts_buffered: usize,
}

/// The throughput window, oldest sample first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThroughputInfo {
    pub labels: Vec<String>,
    /// Kbps rounded to two decimals, parallel to `labels`
    pub values: Vec<String>,
    pub latest_kbps: Option<f64>,
    pub peak_kbps: f64,
}

impl ThroughputInfo {
    pub fn from_samples(samples: &[ThroughputSample]) -> Self {
        Self {
            labels: samples.iter().map(|s| s.label.clone()).collect(),
            values: samples.iter().map(|s| s.display_value()).collect(),
            latest_kbps: samples.last().map(|s| s.value_kbps),
            peak_kbps: samples.iter().map(|s| s.value_kbps).fold(0.0, f64::max),
        }
    }
}

/// Trait for exposing dashboard data to the snapshot cache
pub trait DashboardMonitoring {
    fn get_connection(&self) -> ConnectionState;

    fn get_counters(&self) -> DispatchCounters;

    /// Throughput window, oldest first
    fn get_throughput(&self) -> Vec<ThroughputSample>;

    /// Alert log, newest first
    fn get_alerts(&self) -> Vec<AlertRecord>;

    fn get_status(&self) -> StatusInfo {
        StatusInfo {
            connection: self.get_connection(),
            counters: self.get_counters(),
            throughput_samples: self.get_throughput().len(),
            alerts_buffered: self.get_alerts().len(),
        }
    }
}

impl DashboardMonitoring for DashboardState {
    fn get_connection(&self) -> ConnectionState {
        self.connection
    }

    fn get_counters(&self) -> DispatchCounters {
        self.counters
    }

    fn get_throughput(&self) -> Vec<ThroughputSample> {
        self.throughput.iter().cloned().collect()
    }

    fn get_alerts(&self) -> Vec<AlertRecord> {
        self.alerts.iter().cloned().collect()
    }

    fn get_status(&self) -> StatusInfo {
        StatusInfo {
            connection: self.connection,
            counters: self.counters,
            throughput_samples: self.throughput.len(),
            alerts_buffered: self.alerts.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;

    #[test]
    fn test_state_as_monitoring_source() {
        let mut state = DashboardState::default();
        state.on_open();
        Dispatcher::dispatch_text(
            &mut state,
            r#"{"type":"throughput_data","payload":{"10":{"bytes_total":1024}}}"#,
        )
        .unwrap();
        Dispatcher::dispatch_text(
            &mut state,
            r#"{"type":"throughput_data","payload":{"11":{"bytes_total":3072}}}"#,
        )
        .unwrap();

        let status = state.get_status();
        assert_eq!(status.connection, ConnectionState::Connected);
        assert_eq!(status.throughput_samples, 2);
        assert_eq!(status.alerts_buffered, 0);

        let info = ThroughputInfo::from_samples(&state.get_throughput());
        assert_eq!(info.values, vec!["8.00", "24.00"]);
        assert_eq!(info.latest_kbps, Some(24.0));
        assert_eq!(info.peak_kbps, 24.0);
    }
}
