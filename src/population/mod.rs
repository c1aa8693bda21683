//! User population management
//!
//! Maintains a target number of concurrent sessions that follows a
//! time-indexed ramp schedule. A timed control loop turns each tick into
//! tagged events (Tick, Spawn, Retire) processed from a single queue:
//! ticks compare the live count against the schedule's current target and
//! enqueue the spawns or retires needed to converge. Retirement is
//! cooperative — a retired session finishes its in-flight task before
//! tearing down, never aborting a request midway.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::config::{LoadConfig, RampStep};
use crate::credentials::CredentialPool;
use crate::error::Result;
use crate::http::ApiClient;
use crate::monitoring::LoadMetrics;
use crate::outcome::OutcomeClassifier;
use crate::scheduler::WeightedTaskScheduler;
use crate::session::VirtualUserSession;

/// Control events processed by the ramp loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationEvent {
    /// Periodic schedule check
    Tick,
    /// Bring one session up
    Spawn,
    /// Signal one session to drain and exit
    Retire,
}

/// Step-function view of the ramp schedule
#[derive(Debug, Clone)]
pub struct RampSchedule {
    steps: Vec<RampStep>,
}

impl RampSchedule {
    /// Build from validated config steps (strictly increasing offsets)
    pub fn new(steps: Vec<RampStep>) -> Self {
        Self { steps }
    }

    /// Target concurrency at `elapsed` since run start.
    ///
    /// The target of the last step whose offset has passed; zero before
    /// the first step (schedules conventionally start at offset zero).
    pub fn target_at(&self, elapsed: Duration) -> usize {
        self.steps
            .iter()
            .take_while(|step| Duration::from_secs(step.at_secs) <= elapsed)
            .last()
            .map_or(0, |step| step.target)
    }
}

/// A live session: its stop signal and its join handle
struct SessionHandle {
    stop: watch::Sender<bool>,
    join: JoinHandle<()>,
}

/// Spawns and retires concurrent sessions to track the ramp schedule
pub struct UserPopulationManager {
    schedule: RampSchedule,
    scheduler: Arc<WeightedTaskScheduler>,
    client: Arc<dyn ApiClient>,
    classifier: OutcomeClassifier,
    credentials: CredentialPool,
    metrics: Arc<LoadMetrics>,
    tick_interval: Duration,
    run_seed: u64,
    next_id: usize,
    active: VecDeque<SessionHandle>,
    draining: Vec<JoinHandle<()>>,
}

impl UserPopulationManager {
    pub fn new(
        config: &LoadConfig,
        client: Arc<dyn ApiClient>,
        metrics: Arc<LoadMetrics>,
    ) -> Result<Self> {
        Ok(Self {
            schedule: RampSchedule::new(config.ramp_schedule.clone()),
            scheduler: Arc::new(WeightedTaskScheduler::new(
                &config.task_weights,
                config.think_time,
            )),
            client,
            classifier: OutcomeClassifier::new(config.sla()),
            credentials: config.credentials.build_pool()?,
            metrics,
            tick_interval: config.tick_interval(),
            run_seed: config.seed.unwrap_or_else(rand::random),
            next_id: 0,
            active: VecDeque::new(),
            draining: Vec::new(),
        })
    }

    /// Number of sessions currently live (spawned and not yet retired)
    pub fn live_count(&self) -> usize {
        self.active.len()
    }

    /// Run the ramp control loop, then drain every session.
    ///
    /// Stops when `duration` elapses (checked at tick granularity) or when
    /// the shutdown signal flips. Draining signals every session to stop
    /// and waits for all of them to finish their in-flight tasks.
    pub async fn run(
        mut self,
        duration: Option<Duration>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let started = Instant::now();
        let deadline = duration.map(|limit| started + limit);
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut events: VecDeque<PopulationEvent> = VecDeque::new();

        info!(
            "population manager running, {} ramp steps, seed {}",
            self.schedule.steps.len(),
            self.run_seed
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    break;
                }
            }

            tokio::select! {
                _ = ticker.tick() => {
                    events.push_back(PopulationEvent::Tick);
                    self.process_events(&mut events, started.elapsed());
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("draining {} live sessions", self.active.len());
        self.drain().await;
        Ok(())
    }

    /// Drain the event queue, converging the live count toward the target
    fn process_events(&mut self, events: &mut VecDeque<PopulationEvent>, elapsed: Duration) {
        while let Some(event) = events.pop_front() {
            match event {
                PopulationEvent::Tick => {
                    self.prune();
                    let target = self.schedule.target_at(elapsed);
                    let live = self.active.len();
                    if live < target {
                        for _ in 0..(target - live) {
                            events.push_back(PopulationEvent::Spawn);
                        }
                    } else if live > target {
                        for _ in 0..(live - target) {
                            events.push_back(PopulationEvent::Retire);
                        }
                    }
                }
                PopulationEvent::Spawn => self.spawn_session(),
                PopulationEvent::Retire => self.retire_session(),
            }
        }
    }

    fn spawn_session(&mut self) {
        let id = self.next_id;
        self.next_id += 1;

        let session = VirtualUserSession::new(
            id,
            self.credentials.next(),
            self.run_seed.wrapping_add(id as u64),
            Arc::clone(&self.client),
            self.classifier,
            Arc::clone(&self.metrics),
        );
        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(session.run_loop(Arc::clone(&self.scheduler), stop_rx));
        self.active.push_back(SessionHandle {
            stop: stop_tx,
            join,
        });
        debug!("spawned session {}", id);
    }

    /// Retire the oldest live session: signal it and move it to draining
    fn retire_session(&mut self) {
        if let Some(handle) = self.active.pop_front() {
            let _ = handle.stop.send(true);
            self.draining.push(handle.join);
        }
    }

    /// Drop handles of sessions that already finished
    fn prune(&mut self) {
        self.active.retain(|handle| !handle.join.is_finished());
        self.draining.retain(|join| !join.is_finished());
    }

    async fn drain(mut self) {
        for handle in &self.active {
            let _ = handle.stop.send(true);
        }
        let joins: Vec<JoinHandle<()>> = self
            .active
            .drain(..)
            .map(|handle| handle.join)
            .chain(self.draining.drain(..))
            .collect();
        join_all(joins).await;
    }
}
