//! Weighted task selection and pacing
//!
//! At each draw the configured task table is filtered down to the tasks
//! whose preconditions the session currently satisfies, and one is drawn
//! with probability proportional to its weight among that eligible subset.
//! Restricting the draw to the subset re-normalizes the weights, so when
//! only browse is eligible (fresh session, empty catalog) it is picked
//! every time. Draws are independent; the only memory between them is
//! whatever session state encodes.
//!
//! The scheduler owns no randomness. Callers pass their session's RNG,
//! which keeps selection and pacing deterministic under a fixed seed.

use std::time::Duration;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::config::{TaskWeights, ThinkTimeRange};
use crate::session::SessionState;
use crate::tasks::TaskKind;

/// Weighted-random task scheduler shared by all sessions
pub struct WeightedTaskScheduler {
    table: Vec<(TaskKind, f64)>,
    think_time: ThinkTimeRange,
}

impl WeightedTaskScheduler {
    pub fn new(weights: &TaskWeights, think_time: ThinkTimeRange) -> Self {
        Self {
            table: weights.table(),
            think_time,
        }
    }

    /// Tasks whose precondition the session currently satisfies
    pub fn eligible(&self, state: &SessionState) -> Vec<(TaskKind, f64)> {
        self.table
            .iter()
            .copied()
            .filter(|(task, _)| task.precondition_met(state))
            .collect()
    }

    /// Draw the next task for a session, or `None` if nothing is eligible.
    ///
    /// Every positive-weight eligible task has nonzero selection
    /// probability at every draw.
    pub fn pick<R: Rng>(&self, state: &SessionState, rng: &mut R) -> Option<TaskKind> {
        let eligible = self.eligible(state);
        if eligible.is_empty() {
            return None;
        }
        let dist = WeightedIndex::new(eligible.iter().map(|(_, weight)| *weight)).ok()?;
        Some(eligible[dist.sample(rng)].0)
    }

    /// Draw a think-time pause uniformly from the configured range
    pub fn think_time<R: Rng>(&self, rng: &mut R) -> Duration {
        let (min, max) = (self.think_time.min_secs, self.think_time.max_secs);
        if max <= min {
            return Duration::from_secs_f64(min.max(0.0));
        }
        Duration::from_secs_f64(rng.gen_range(min..=max))
    }
}
