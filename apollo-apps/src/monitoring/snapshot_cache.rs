//! Snapshot cache for monitoring data
//!
//! The dashboard state is owned by the panel's main loop and is never shared. To serve it over
//! HTTP, the loop periodically copies it into a `SnapshotCache`; API requests read from the cache
//! and never wait on the loop.
//!
//! ```text
//! Main loop                          Monitoring
//! ─────────                          ──────────
//!     │                                  │
//!     │ (owns DashboardState,            │
//!     │  applies frames)                 │
//!     │                                  │
//!     └── refresh() every N secs ────────┤
//!                                        │
//!                              ┌─────────▼─────────┐
//!                              │  SnapshotCache    │
//!                              │  (RwLock, fast)   │
//!                              └─────────┬─────────┘
//!                                        │
//!                    ┌───────────────────┼───────────────────┐
//!                    │                   │                   │
//!              ┌─────▼─────┐       ┌─────▼─────┐       ┌─────▼─────┐
//!              │ /metrics  │       │ /api/v1/* │       │ /health   │
//!              └───────────┘       └───────────┘       └───────────┘
//! ```

use std::sync::RwLock;
use std::time::{Duration, Instant};

use super::dashboard::{DashboardMonitoring, StatusInfo};
use crate::{message::AlertRecord, stores::ThroughputSample};

/// Cached snapshot of dashboard data.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub timestamp: Option<Instant>,
    pub status: Option<StatusInfo>,
    pub throughput: Vec<ThroughputSample>,
    pub alerts: Vec<AlertRecord>,
}

impl DashboardSnapshot {
    /// Check if this snapshot is stale (older than the given duration)
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match self.timestamp {
            None => true,
            Some(ts) => ts.elapsed() > max_age,
        }
    }

    /// Get the age of this snapshot
    pub fn age(&self) -> Option<Duration> {
        self.timestamp.map(|ts| ts.elapsed())
    }
}

/// A cache that holds the latest dashboard snapshot.
pub struct SnapshotCache {
    snapshot: RwLock<DashboardSnapshot>,
    refresh_interval: Duration,
}

impl SnapshotCache {
    /// Create an empty cache that the owner intends to refresh every `refresh_interval`.
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            snapshot: RwLock::new(DashboardSnapshot::default()),
            refresh_interval,
        }
    }

    /// Get the current snapshot.
    ///
    /// The returned snapshot may be up to `refresh_interval` old.
    pub fn get_snapshot(&self) -> DashboardSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Refresh the cache by copying from `source`.
    pub fn refresh(&self, source: &dyn DashboardMonitoring) {
        let new_snapshot = DashboardSnapshot {
            timestamp: Some(Instant::now()),
            status: Some(source.get_status()),
            throughput: source.get_throughput(),
            alerts: source.get_alerts(),
        };

        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = new_snapshot;
    }

    /// Get the refresh interval
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}
