//! Virtual user sessions
//!
//! Each session simulates one client working through the target API:
//! authenticate once, then loop picking weighted tasks, executing them,
//! recording the classified result, and pacing with a think-time pause.
//! A session exclusively owns its mutable state; the only thing it shares
//! is the metrics handle.
//!
//! Sessions carry an injected, seedable RNG so a run can be replayed
//! deterministically in tests. Authentication failure degrades the session
//! instead of terminating it: it keeps generating load unauthenticated and
//! the resulting rejections are classified like any other failure.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::watch;

use crate::credentials::Credential;
use crate::http::{ApiClient, Method};
use crate::monitoring::LoadMetrics;
use crate::outcome::{Extracted, Extraction, Outcome, OutcomeClassifier, Product, TaskResult};
use crate::scheduler::WeightedTaskScheduler;
use crate::tasks::TaskKind;

/// Mutable per-user state, exclusively owned by its session
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Bearer token, present only after a successful login
    pub token: Option<String>,
    /// Last-seen product catalog, possibly empty
    pub catalog: Vec<Product>,
    /// Active cart identifier, cleared by checkout
    pub cart_id: Option<i64>,
    /// Set when login was rejected; the session continues unauthenticated
    pub degraded: bool,
}

/// One simulated user executing tasks against the target API
pub struct VirtualUserSession {
    id: usize,
    credential: Credential,
    state: SessionState,
    rng: ChaCha8Rng,
    client: Arc<dyn ApiClient>,
    classifier: OutcomeClassifier,
    metrics: Arc<LoadMetrics>,
}

impl VirtualUserSession {
    pub fn new(
        id: usize,
        credential: Credential,
        seed: u64,
        client: Arc<dyn ApiClient>,
        classifier: OutcomeClassifier,
        metrics: Arc<LoadMetrics>,
    ) -> Self {
        Self {
            id,
            credential,
            state: SessionState::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            client,
            classifier,
            metrics,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Authenticate against the target.
    ///
    /// On success the token is stored and sent with every subsequent
    /// request. On rejection the session is marked degraded and keeps
    /// operating; authorized endpoints will answer with errors that the
    /// classifier counts like any other unexpected status.
    pub async fn start(&mut self) {
        let body = serde_json::json!({
            "username": self.credential.username,
            "password": self.credential.password,
        });
        let login = self
            .client
            .request(Method::Post, "/login", Some(body), &[])
            .await;

        match login {
            Ok(response) => {
                let result =
                    self.classifier
                        .classify("login", 200, Extraction::AccessToken, &response);
                if let Extracted::Token(token) = &result.extracted {
                    self.state.token = Some(token.clone());
                    debug!("session {} logged in as {}", self.id, self.credential.username);
                } else {
                    self.state.degraded = true;
                    self.metrics.record_auth_failure();
                    warn!(
                        "session {} failed to log in as {}, continuing degraded",
                        self.id, self.credential.username
                    );
                }
            }
            Err(err) => {
                self.state.degraded = true;
                self.metrics.record_auth_failure();
                warn!(
                    "session {} login transport failure: {}, continuing degraded",
                    self.id, err
                );
            }
        }
    }

    /// Execute one task end to end and apply its state mutation.
    ///
    /// Returns `None` when the precondition is unmet: the task is skipped,
    /// not failed. The scheduler filters ineligible tasks before drawing,
    /// so this guard only matters for direct callers.
    pub async fn run_task(&mut self, task: TaskKind) -> Option<TaskResult> {
        if !task.precondition_met(&self.state) {
            return None;
        }
        let (method, path, body) = self.build_request(task)?;
        let headers = self.auth_headers();

        let result = match self.client.request(method, &path, body, &headers).await {
            Ok(response) => self.classifier.classify(
                task.name(),
                task.expected_status(),
                task.extraction(),
                &response,
            ),
            Err(err) => {
                debug!("session {} {}: transport failure: {}", self.id, task.name(), err);
                TaskResult::transport_failure(task.name(), Duration::ZERO)
            }
        };

        if let Outcome::Failure(reason) = &result.outcome {
            debug!(
                "session {} {} failed: {}",
                self.id,
                task.name(),
                reason.label()
            );
        }

        self.apply(task, &result);
        Some(result)
    }

    /// Sequential task loop: pick, execute, record, think, check stop.
    ///
    /// The stop signal is cooperative: an in-flight task always runs to
    /// completion and its result is recorded before the loop exits. A stop
    /// arriving during the think-time pause cuts the pause short.
    pub async fn run_loop(
        mut self,
        scheduler: Arc<WeightedTaskScheduler>,
        mut stop: watch::Receiver<bool>,
    ) {
        self.metrics.session_started();
        self.start().await;

        while !*stop.borrow() {
            if let Some(task) = scheduler.pick(&self.state, &mut self.rng) {
                if let Some(result) = self.run_task(task).await {
                    self.metrics.record(&result);
                }
            }

            let pause = scheduler.think_time(&mut self.rng);
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                changed = stop.changed() => {
                    // Sender gone means the population manager is shutting
                    // down without having signaled; treat it as a stop.
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.metrics.session_finished();
        debug!("session {} drained", self.id);
    }

    fn build_request(
        &mut self,
        task: TaskKind,
    ) -> Option<(Method, String, Option<serde_json::Value>)> {
        match task {
            TaskKind::BrowseProducts => Some((Method::Get, "/products".to_string(), None)),
            TaskKind::ViewProduct => {
                let product = self.pick_product()?;
                Some((Method::Get, format!("/products/{}", product.id), None))
            }
            TaskKind::AddToCart => {
                let product = self.pick_product()?;
                Some((
                    Method::Post,
                    "/cart".to_string(),
                    Some(serde_json::json!({ "product_id": product.id })),
                ))
            }
            TaskKind::FinalizeOrder => {
                let cart_id = self.state.cart_id?;
                Some((
                    Method::Post,
                    "/order".to_string(),
                    Some(serde_json::json!({ "cart_id": cart_id })),
                ))
            }
        }
    }

    fn pick_product(&mut self) -> Option<Product> {
        self.state.catalog.choose(&mut self.rng).cloned()
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        match &self.state.token {
            Some(token) => vec![("Authorization".to_string(), format!("Bearer {}", token))],
            None => Vec::new(),
        }
    }

    fn apply(&mut self, task: TaskKind, result: &TaskResult) {
        if !result.is_success() {
            return;
        }
        match &result.extracted {
            Extracted::Catalog(products) => {
                self.state.catalog = products.clone();
            }
            Extracted::CartId(cart_id) => {
                self.state.cart_id = Some(*cart_id);
            }
            Extracted::Token(token) => {
                self.state.token = Some(token.clone());
            }
            Extracted::None => {
                if task == TaskKind::FinalizeOrder {
                    // Order placed, the cart is gone
                    self.state.cart_id = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;

    fn session_with_state(state: SessionState) -> VirtualUserSession {
        struct NeverClient;

        #[async_trait::async_trait]
        impl ApiClient for NeverClient {
            async fn request(
                &self,
                _method: Method,
                _path: &str,
                _json_body: Option<serde_json::Value>,
                _headers: &[(String, String)],
            ) -> crate::error::Result<crate::http::HttpResponse> {
                Err(crate::error::Error::Transport("unused".into()))
            }
        }

        let mut session = VirtualUserSession::new(
            0,
            Credential {
                username: "user1".to_string(),
                password: "password".to_string(),
            },
            0,
            Arc::new(NeverClient),
            OutcomeClassifier::new(Duration::from_secs(1)),
            Arc::new(LoadMetrics::new()),
        );
        session.state = state;
        session
    }

    #[test]
    fn test_auth_headers_carry_bearer_token() {
        let session = session_with_state(SessionState {
            token: Some("abc".to_string()),
            ..SessionState::default()
        });
        assert_eq!(
            session.auth_headers(),
            vec![("Authorization".to_string(), "Bearer abc".to_string())]
        );
    }

    #[test]
    fn test_unauthenticated_session_sends_no_headers() {
        let session = session_with_state(SessionState::default());
        assert!(session.auth_headers().is_empty());
    }

    #[test]
    fn test_successful_checkout_clears_cart() {
        let mut session = session_with_state(SessionState {
            cart_id: Some(9),
            ..SessionState::default()
        });
        let result = TaskResult {
            task: "finalize_order",
            outcome: Outcome::Success,
            elapsed: Duration::from_millis(50),
            extracted: Extracted::None,
        };
        session.apply(TaskKind::FinalizeOrder, &result);
        assert_eq!(session.state.cart_id, None);
    }

    #[test]
    fn test_failed_checkout_keeps_cart() {
        let mut session = session_with_state(SessionState {
            cart_id: Some(9),
            ..SessionState::default()
        });
        let result = TaskResult {
            task: "finalize_order",
            outcome: Outcome::Failure(crate::outcome::FailureReason::UnexpectedStatusCode(500)),
            elapsed: Duration::from_millis(50),
            extracted: Extracted::None,
        };
        session.apply(TaskKind::FinalizeOrder, &result);
        assert_eq!(session.state.cart_id, Some(9));
    }

    #[test]
    fn test_finalize_request_carries_cart_id() {
        let mut session = session_with_state(SessionState {
            cart_id: Some(7),
            ..SessionState::default()
        });
        let (method, path, body) = session.build_request(TaskKind::FinalizeOrder).unwrap();
        assert_eq!(method, Method::Post);
        assert_eq!(path, "/order");
        assert_eq!(body.unwrap()["cart_id"], 7);
    }
}
