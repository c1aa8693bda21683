//! Configuration surface for a load run
//!
//! This module provides the recognized options with:
//! - TOML file loading
//! - Sensible defaults matching the stock scenario
//! - Startup validation (the only fatal error class in a run)

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credentials::{Credential, CredentialPool};
use crate::error::{Error, Result};
use crate::tasks::TaskKind;

/// Complete configuration for one load run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Base URL of the target API
    pub target_base_url: String,
    /// Maximum acceptable response time before a response counts as failed
    pub sla_threshold_ms: u64,
    /// Transport-level request timeout in seconds
    pub request_timeout_secs: u64,
    /// Population control loop tick interval in milliseconds
    pub tick_interval_ms: u64,
    /// Total run duration in seconds; unset runs until interrupted
    pub run_duration_secs: Option<u64>,
    /// Run-level RNG seed for deterministic replay; unset draws from entropy
    pub seed: Option<u64>,
    /// Idle pause range between a session's consecutive tasks
    pub think_time: ThinkTimeRange,
    /// Relative selection weights for the task table
    pub task_weights: TaskWeights,
    /// Credential pool settings
    pub credentials: CredentialConfig,
    /// Time-indexed target concurrency curve
    pub ramp_schedule: Vec<RampStep>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            target_base_url: "http://localhost:5000".to_string(),
            sla_threshold_ms: 1000,
            request_timeout_secs: 30,
            tick_interval_ms: 1000,
            run_duration_secs: None,
            seed: None,
            think_time: ThinkTimeRange::default(),
            task_weights: TaskWeights::default(),
            credentials: CredentialConfig::default(),
            ramp_schedule: vec![RampStep {
                at_secs: 0,
                target: 10,
            }],
        }
    }
}

/// One step of the ramp schedule: hold `target` sessions from `at_secs` on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampStep {
    pub at_secs: u64,
    pub target: usize,
}

/// Uniform think-time range in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThinkTimeRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for ThinkTimeRange {
    fn default() -> Self {
        // The stock scenario paces like a human: 1-5 seconds between tasks
        Self {
            min_secs: 1.0,
            max_secs: 5.0,
        }
    }
}

impl ThinkTimeRange {
    pub fn min(&self) -> Duration {
        Duration::from_secs_f64(self.min_secs)
    }

    pub fn max(&self) -> Duration {
        Duration::from_secs_f64(self.max_secs)
    }
}

/// Relative selection weights, one per task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskWeights {
    pub browse_products: f64,
    pub view_product: f64,
    pub add_to_cart: f64,
    pub finalize_order: f64,
}

impl Default for TaskWeights {
    fn default() -> Self {
        Self {
            browse_products: TaskKind::BrowseProducts.default_weight(),
            view_product: TaskKind::ViewProduct.default_weight(),
            add_to_cart: TaskKind::AddToCart.default_weight(),
            finalize_order: TaskKind::FinalizeOrder.default_weight(),
        }
    }
}

impl TaskWeights {
    pub fn weight_for(&self, task: TaskKind) -> f64 {
        match task {
            TaskKind::BrowseProducts => self.browse_products,
            TaskKind::ViewProduct => self.view_product,
            TaskKind::AddToCart => self.add_to_cart,
            TaskKind::FinalizeOrder => self.finalize_order,
        }
    }

    /// The task table with zero-weight tasks removed
    pub fn table(&self) -> Vec<(TaskKind, f64)> {
        TaskKind::ALL
            .iter()
            .map(|&task| (task, self.weight_for(task)))
            .filter(|(_, weight)| *weight > 0.0)
            .collect()
    }
}

/// Credential pool settings: a generated pool or an explicit list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Size of the generated `user1..userN` pool
    pub pool_size: usize,
    /// Shared password for the generated pool
    pub password: String,
    /// Explicit credential list; takes precedence over the generated pool
    pub users: Option<Vec<Credential>>,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        // Matches the target environment's seeded population
        Self {
            pool_size: 1000,
            password: "password".to_string(),
            users: None,
        }
    }
}

impl CredentialConfig {
    pub fn build_pool(&self) -> Result<CredentialPool> {
        match &self.users {
            Some(users) => CredentialPool::from_list(users.clone()),
            None => CredentialPool::generated(self.pool_size, &self.password),
        }
    }
}

impl LoadConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: LoadConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// These are the only errors fatal to a run; everything at the
    /// per-request level is classified and counted instead.
    pub fn validate(&self) -> Result<()> {
        if self.target_base_url.is_empty() {
            return Err(Error::Config("target_base_url must not be empty".into()));
        }
        if self.sla_threshold_ms == 0 {
            return Err(Error::Config("sla_threshold_ms must be positive".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be positive".into()));
        }

        let weights = [
            self.task_weights.browse_products,
            self.task_weights.view_product,
            self.task_weights.add_to_cart,
            self.task_weights.finalize_order,
        ];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(Error::Config("task weights must be finite and non-negative".into()));
        }
        if self.task_weights.table().is_empty() {
            return Err(Error::Config("task table is empty: every weight is zero".into()));
        }

        if self.think_time.min_secs < 0.0 || self.think_time.max_secs < self.think_time.min_secs {
            return Err(Error::Config(format!(
                "think_time range [{}, {}] is invalid",
                self.think_time.min_secs, self.think_time.max_secs
            )));
        }

        if self.ramp_schedule.is_empty() {
            return Err(Error::Config("ramp_schedule must contain at least one step".into()));
        }
        for pair in self.ramp_schedule.windows(2) {
            if pair[1].at_secs <= pair[0].at_secs {
                return Err(Error::Config(format!(
                    "ramp_schedule offsets must be strictly increasing ({}s then {}s)",
                    pair[0].at_secs, pair[1].at_secs
                )));
            }
        }

        if self.credentials.users.as_ref().map_or(self.credentials.pool_size == 0, Vec::is_empty) {
            return Err(Error::Config("credential pool is empty".into()));
        }

        Ok(())
    }

    pub fn sla(&self) -> Duration {
        Duration::from_millis(self.sla_threshold_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn run_duration(&self) -> Option<Duration> {
        self.run_duration_secs.map(Duration::from_secs)
    }

    /// Default configuration rendered as TOML, for `stampede sample-config`
    pub fn sample_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}
