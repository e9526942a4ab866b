// src/pipeline/mod.rs

pub mod dwell_log;
pub mod metrics;

pub use dwell_log::DwellLog;
pub use metrics::{MetricsSummary, SessionMetrics};
