//! Aggregate metrics collection for a load run
//!
//! The metrics handle is the only process-wide shared mutable state:
//! every session records its task results here concurrently. Counters are
//! atomics; the latency window sits behind a lock because percentile
//! extraction needs the whole sample set.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::outcome::{FailureReason, Outcome, TaskResult};

/// Number of latency samples kept in the rolling window
const LATENCY_WINDOW: usize = 10_000;

/// Shared aggregate counters for one load run
pub struct LoadMetrics {
    /// Total tasks executed, success or failure
    pub tasks_completed: AtomicU64,
    /// Tasks classified as successful
    pub success_count: AtomicU64,
    /// Failures by reason
    pub failure_unexpected_status: AtomicU64,
    pub failure_response_time: AtomicU64,
    pub failure_malformed: AtomicU64,
    pub failure_transport: AtomicU64,
    /// Rejected logins (sessions continue degraded)
    pub auth_failures: AtomicU64,
    /// Session lifecycle counters
    pub sessions_spawned: AtomicU64,
    pub sessions_retired: AtomicU64,
    pub live_sessions: AtomicUsize,
    /// Rolling response-time window
    latency: RwLock<LatencyTracker>,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Default for LoadMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadMetrics {
    pub fn new() -> Self {
        Self {
            tasks_completed: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_unexpected_status: AtomicU64::new(0),
            failure_response_time: AtomicU64::new(0),
            failure_malformed: AtomicU64::new(0),
            failure_transport: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),
            sessions_spawned: AtomicU64::new(0),
            sessions_retired: AtomicU64::new(0),
            live_sessions: AtomicUsize::new(0),
            latency: RwLock::new(LatencyTracker::new(LATENCY_WINDOW)),
            start_time: Instant::now(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Record one executed task result
    pub fn record(&self, result: &TaskResult) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        match &result.outcome {
            Outcome::Success => {
                self.success_count.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Failure(reason) => {
                let counter = match reason {
                    FailureReason::UnexpectedStatusCode(_) => &self.failure_unexpected_status,
                    FailureReason::ResponseTimeExceeded => &self.failure_response_time,
                    FailureReason::MalformedResponse => &self.failure_malformed,
                    FailureReason::Transport => &self.failure_transport,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
        // Transport failures never produced a response, so they carry no
        // meaningful latency sample.
        if !matches!(result.outcome, Outcome::Failure(FailureReason::Transport)) {
            self.latency
                .write()
                .add_sample(result.elapsed.as_secs_f64() * 1000.0);
        }
    }

    /// Record a rejected login
    pub fn record_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A session entered its task loop
    pub fn session_started(&self) {
        self.sessions_spawned.fetch_add(1, Ordering::Relaxed);
        self.live_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// A session drained and exited its task loop
    pub fn session_finished(&self) {
        self.sessions_retired.fetch_add(1, Ordering::Relaxed);
        self.live_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    /// Point-in-time snapshot for the external reporting collaborator
    pub fn snapshot(&self) -> MetricsSnapshot {
        let latency = self.latency.read();
        MetricsSnapshot {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            uptime_seconds: self.uptime_seconds(),
            live_sessions: self.live_sessions.load(Ordering::Relaxed),
            sessions_spawned: self.sessions_spawned.load(Ordering::Relaxed),
            sessions_retired: self.sessions_retired.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            success_count: self.success_count.load(Ordering::Relaxed),
            failures: FailureCounts {
                unexpected_status_code: self.failure_unexpected_status.load(Ordering::Relaxed),
                response_time_exceeded: self.failure_response_time.load(Ordering::Relaxed),
                malformed_response: self.failure_malformed.load(Ordering::Relaxed),
                transport: self.failure_transport.load(Ordering::Relaxed),
                authentication: self.auth_failures.load(Ordering::Relaxed),
            },
            latency: LatencySnapshot {
                average_ms: latency.average(),
                p50_ms: latency.percentile(50.0),
                p90_ms: latency.percentile(90.0),
                p99_ms: latency.percentile(99.0),
            },
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        let mut output = String::new();

        output.push_str(&format!(
            "# HELP stampede_tasks_completed_total Total tasks executed\n\
             # TYPE stampede_tasks_completed_total counter\n\
             stampede_tasks_completed_total {}\n",
            snapshot.tasks_completed
        ));

        output.push_str(&format!(
            "# HELP stampede_tasks_succeeded_total Tasks classified successful\n\
             # TYPE stampede_tasks_succeeded_total counter\n\
             stampede_tasks_succeeded_total {}\n",
            snapshot.success_count
        ));

        output.push_str(
            "# HELP stampede_task_failures_total Task failures by reason\n\
             # TYPE stampede_task_failures_total counter\n",
        );
        for (reason, count) in [
            ("unexpected_status_code", snapshot.failures.unexpected_status_code),
            ("response_time_exceeded", snapshot.failures.response_time_exceeded),
            ("malformed_response", snapshot.failures.malformed_response),
            ("transport", snapshot.failures.transport),
            ("authentication", snapshot.failures.authentication),
        ] {
            output.push_str(&format!(
                "stampede_task_failures_total{{reason=\"{}\"}} {}\n",
                reason, count
            ));
        }

        output.push_str(&format!(
            "# HELP stampede_live_sessions Currently running virtual users\n\
             # TYPE stampede_live_sessions gauge\n\
             stampede_live_sessions {}\n",
            snapshot.live_sessions
        ));

        output.push_str(
            "# HELP stampede_response_time_ms Response time quantiles\n\
             # TYPE stampede_response_time_ms gauge\n",
        );
        for (quantile, value) in [
            ("0.5", snapshot.latency.p50_ms),
            ("0.9", snapshot.latency.p90_ms),
            ("0.99", snapshot.latency.p99_ms),
        ] {
            output.push_str(&format!(
                "stampede_response_time_ms{{quantile=\"{}\"}} {}\n",
                quantile, value
            ));
        }

        output
    }
}

/// Latency tracker with rolling window
pub struct LatencyTracker {
    samples: VecDeque<f64>,
    max_samples: usize,
}

impl LatencyTracker {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    pub fn add_sample(&mut self, latency_ms: f64) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(latency_ms);
    }

    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().sum::<f64>() / self.samples.len() as f64
        }
    }

    pub fn percentile(&self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let index = ((p / 100.0) * (sorted.len() - 1) as f64) as usize;
        sorted[index]
    }
}

/// Metrics snapshot for export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: u64,
    pub uptime_seconds: u64,
    pub live_sessions: usize,
    pub sessions_spawned: u64,
    pub sessions_retired: u64,
    pub tasks_completed: u64,
    pub success_count: u64,
    pub failures: FailureCounts,
    pub latency: LatencySnapshot,
}

/// Failure counters by reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureCounts {
    pub unexpected_status_code: u64,
    pub response_time_exceeded: u64,
    pub malformed_response: u64,
    pub transport: u64,
    pub authentication: u64,
}

impl FailureCounts {
    /// Total task failures (login rejections are tracked separately and
    /// not part of task counts)
    pub fn task_total(&self) -> u64 {
        self.unexpected_status_code
            + self.response_time_exceeded
            + self.malformed_response
            + self.transport
    }
}

/// Latency percentiles in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencySnapshot {
    pub average_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
}
