//! Dashboard state owned by the panel's main loop.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stores::{AlertLog, ThroughputSeries};

/// Link status with the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Short label shown by the connectivity indicator.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connected => "Active",
            ConnectionState::Disconnected => "Inactive",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Frame and connection counters. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchCounters {
    pub throughput_frames: u64,
    pub alert_frames: u64,
    pub ignored_frames: u64,
    pub malformed_frames: u64,
    pub reconnects_scheduled: u64,
}

impl DispatchCounters {
    pub fn total_frames(&self) -> u64 {
        self.throughput_frames + self.alert_frames + self.ignored_frames + self.malformed_frames
    }
}

/// Everything the views render: both stores plus the connection state.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub throughput: ThroughputSeries,
    pub alerts: AlertLog,
    pub connection: ConnectionState,
    pub counters: DispatchCounters,
}

impl DashboardState {
    pub fn new(throughput_history_len: usize, alert_log_len: usize) -> Self {
        Self {
            throughput: ThroughputSeries::with_capacity(throughput_history_len),
            alerts: AlertLog::with_capacity(alert_log_len),
            connection: ConnectionState::Disconnected,
            counters: DispatchCounters::default(),
        }
    }

    /// Connection opened.
    pub fn on_open(&mut self) {
        self.connection = ConnectionState::Connected;
    }

    /// Connection closed; a reconnect has been scheduled by the connection manager.
    pub fn on_close(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.counters.reconnects_scheduled += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_transitions() {
        let mut state = DashboardState::default();
        assert_eq!(state.connection, ConnectionState::Disconnected);
        assert_eq!(state.connection.label(), "Inactive");

        state.on_open();
        assert!(state.connection.is_connected());
        assert_eq!(state.connection.label(), "Active");

        state.on_close();
        assert_eq!(state.connection, ConnectionState::Disconnected);
        assert_eq!(state.counters.reconnects_scheduled, 1);
    }

    #[test]
    fn test_new_uses_given_capacities() {
        let state = DashboardState::new(10, 5);
        assert_eq!(state.throughput.capacity(), 10);
        assert_eq!(state.alerts.capacity(), 5);
        assert!(state.throughput.is_empty());
        assert!(state.alerts.is_empty());
    }
}
