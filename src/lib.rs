//! Stampede - a synthetic load generator for session-oriented web APIs
//!
//! Stampede simulates a population of concurrent virtual users working
//! through a login → browse → cart → checkout flow, measuring latency and
//! correctness along the way:
//! - config: the recognized options for a run (ramp schedule, think time,
//!   SLA threshold, task weights, credential pool)
//! - http: the transport seam the core drives (reqwest in production)
//! - tasks: the weighted task table with typed preconditions
//! - scheduler: weighted-random selection over the eligible subset
//! - session: the per-user state machine and sequential task loop
//! - outcome: response classification (SLA first, then status, then body)
//! - population: the ramp control loop spawning and retiring sessions
//! - monitoring: aggregate counters and latency percentiles

pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod monitoring;
pub mod outcome;
pub mod population;
pub mod scheduler;
pub mod session;
pub mod tasks;
pub mod utils;

// Re-export commonly used types for easy access
pub use config::{CredentialConfig, LoadConfig, RampStep, TaskWeights, ThinkTimeRange};
pub use credentials::{Credential, CredentialPool};
pub use error::{Error, Result};
pub use http::{ApiClient, HttpResponse, Method, ReqwestClient};
pub use monitoring::{LoadMetrics, MetricsSnapshot};
pub use outcome::{
    Extracted, Extraction, FailureReason, Outcome, OutcomeClassifier, Product, TaskResult,
};
pub use population::{PopulationEvent, RampSchedule, UserPopulationManager};
pub use scheduler::WeightedTaskScheduler;
pub use session::{SessionState, VirtualUserSession};
pub use tasks::TaskKind;
