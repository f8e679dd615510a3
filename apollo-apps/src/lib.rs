//! ## Apollo Apps
//!
//! Shared building blocks for the Apollo command panel.
//!
//! The command panel is a read-only viewer: an external backend pushes JSON frames over a single
//! WebSocket connection and this crate turns them into bounded, render-ready state.
//!
//! - [`message`]: the inbound wire envelope and its parse boundary
//! - [`stores`]: the rolling throughput series and the newest-first alert log
//! - [`state`]: the [`state::DashboardState`] that owns both stores and the connection state
//! - [`dispatcher`]: routes parsed frames into the stores, dropping malformed ones
//! - [`monitoring`]: snapshot cache, HTTP JSON API and Prometheus metrics
//! - [`task_manager`]: tracks spawned tasks so they can be joined or aborted on shutdown

pub mod config_helpers;
pub mod dispatcher;
pub mod message;
pub mod monitoring;
pub mod state;
pub mod stores;
pub mod task_manager;
pub mod time_fmt;

/// Default backend endpoint the panel connects to when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "ws://localhost:8000/ws/data";

/// Delay between a lost connection and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;
