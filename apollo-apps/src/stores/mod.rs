//! Bounded, render-ready stores.
//!
//! Both stores are plain owned values. They are mutated only by the dispatcher and read by the
//! presentation layer and the monitoring snapshot.

pub mod alert_log;
pub mod throughput;

pub use alert_log::{AlertLog, DEFAULT_ALERT_LOG_LEN};
pub use throughput::{ThroughputSample, ThroughputSeries, DEFAULT_THROUGHPUT_HISTORY_LEN};
