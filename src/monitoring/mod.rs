//! Monitoring and metrics for load runs

pub mod metrics;

pub use metrics::{
    FailureCounts, LatencySnapshot, LatencyTracker, LoadMetrics, MetricsSnapshot,
};
