//! Monitoring for the command panel.
//!
//! Provides an HTTP JSON API and Prometheus metrics describing what the panel currently shows.
//! Read-only - never touches the dashboard state directly.
//!
//! ## Architecture
//!
//! - **Source**: anything implementing [`DashboardMonitoring`], in practice the
//!   [`DashboardState`](crate::state::DashboardState) owned by the main loop
//! - **Cache**: [`SnapshotCache`], refreshed by the state owner on a fixed interval
//! - **Server**: [`MonitoringServer`], which only ever reads the cache

pub mod dashboard;
pub mod http_server;
pub mod prometheus_metrics;
pub mod snapshot_cache;

pub use dashboard::{DashboardMonitoring, StatusInfo, ThroughputInfo};
pub use http_server::MonitoringServer;
pub use snapshot_cache::{DashboardSnapshot, SnapshotCache};
