//! Application state management and initialization
//!
//! This module contains the main application struct wiring configuration,
//! transport, metrics, and the population manager together, plus the
//! periodic progress reporter and interrupt handling.

use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;

use stampede::{LoadConfig, LoadMetrics, ReqwestClient, Result, UserPopulationManager};

/// Main Stampede application
pub struct StampedeApp {
    pub config: LoadConfig,
    pub metrics: Arc<LoadMetrics>,
}

impl StampedeApp {
    /// Initialize a new Stampede application from validated configuration
    pub fn new(config: LoadConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(LoadMetrics::new()),
        }
    }

    /// Run the load test to completion (duration elapsed or interrupt)
    pub async fn start(&self, duration_override: Option<Duration>) -> Result<()> {
        println!("🐏 Stampede - synthetic load generator");
        println!("🎯 Target: {}", self.config.target_base_url);
        println!(
            "⏱️ SLA threshold: {}ms, think time: {:.1}-{:.1}s",
            self.config.sla_threshold_ms,
            self.config.think_time.min_secs,
            self.config.think_time.max_secs
        );
        println!();

        let client = Arc::new(ReqwestClient::new(
            &self.config.target_base_url,
            self.config.request_timeout(),
        )?);
        let manager =
            UserPopulationManager::new(&self.config, client, Arc::clone(&self.metrics))?;

        // Cooperative shutdown on interrupt: sessions finish their
        // in-flight tasks before the run ends.
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, draining sessions");
                let _ = shutdown_tx.send(true);
            }
        });

        let reporter = self.spawn_reporter();

        let duration = duration_override.or_else(|| self.config.run_duration());
        manager.run(duration, shutdown_rx).await?;
        reporter.abort();

        self.print_summary();
        Ok(())
    }

    /// Periodic progress snapshot to the log
    fn spawn_reporter(&self) -> tokio::task::JoinHandle<()> {
        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(10));
            // The first tick fires immediately; skip it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let snapshot = metrics.snapshot();
                info!(
                    "live={} tasks={} ok={} failed={} p50={:.0}ms p90={:.0}ms p99={:.0}ms",
                    snapshot.live_sessions,
                    snapshot.tasks_completed,
                    snapshot.success_count,
                    snapshot.failures.task_total(),
                    snapshot.latency.p50_ms,
                    snapshot.latency.p90_ms,
                    snapshot.latency.p99_ms,
                );
            }
        })
    }

    fn print_summary(&self) {
        let snapshot = self.metrics.snapshot();
        println!();
        println!("📊 Run complete after {}s", snapshot.uptime_seconds);
        println!(
            "   sessions: {} spawned, {} retired",
            snapshot.sessions_spawned, snapshot.sessions_retired
        );
        println!(
            "   tasks: {} total, {} ok, {} failed",
            snapshot.tasks_completed,
            snapshot.success_count,
            snapshot.failures.task_total()
        );
        println!(
            "   failures: {} status, {} slow, {} malformed, {} transport, {} auth",
            snapshot.failures.unexpected_status_code,
            snapshot.failures.response_time_exceeded,
            snapshot.failures.malformed_response,
            snapshot.failures.transport,
            snapshot.failures.authentication
        );
        println!(
            "   latency: avg {:.1}ms, p50 {:.0}ms, p90 {:.0}ms, p99 {:.0}ms",
            snapshot.latency.average_ms,
            snapshot.latency.p50_ms,
            snapshot.latency.p90_ms,
            snapshot.latency.p99_ms
        );
    }
}
