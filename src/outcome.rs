//! Response outcome classification
//!
//! Turns a raw response plus its elapsed time into a [`TaskResult`] using
//! a fixed decision order:
//!
//! 1. elapsed time over the SLA threshold → failure, regardless of status
//! 2. unexpected status code → failure, carrying the actual code
//! 3. required-field extraction fails → malformed response
//! 4. otherwise success, with extracted fields attached
//!
//! Slow-but-correct responses are deliberately flagged as failures so that
//! performance regressions are distinguishable from functional bugs.
//! Classification is a pure function of its inputs: running it twice on
//! the same recorded response yields the identical result.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::HttpResponse;

/// One product row from the target catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

/// Required-field extraction a task expects from a successful body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Body content is not inspected
    None,
    /// Body must carry a string `access_token` field
    AccessToken,
    /// Body must be a JSON array of products
    Catalog,
    /// Body must carry an integer `cart_id` field
    CartId,
}

/// Fields pulled out of a successful response body
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Extracted {
    #[default]
    None,
    Token(String),
    Catalog(Vec<Product>),
    CartId(i64),
}

/// Failure classes tracked by the aggregate counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Status code differed from the task's expected code
    UnexpectedStatusCode(u16),
    /// Response completed but took longer than the SLA threshold
    ResponseTimeExceeded,
    /// Body was missing a required field or failed to parse
    MalformedResponse,
    /// The transport produced no response at all
    Transport,
}

impl FailureReason {
    /// Stable label for counters and log lines
    pub fn label(&self) -> &'static str {
        match self {
            FailureReason::UnexpectedStatusCode(_) => "unexpected_status_code",
            FailureReason::ResponseTimeExceeded => "response_time_exceeded",
            FailureReason::MalformedResponse => "malformed_response",
            FailureReason::Transport => "transport",
        }
    }
}

/// Task outcome tag
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success,
    Failure(FailureReason),
}

/// Result of one executed task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    /// Name of the task that produced this result
    pub task: &'static str,
    pub outcome: Outcome,
    /// Wall-clock time of the request, zero when the transport failed
    pub elapsed: Duration,
    /// Fields extracted from a successful body, applied to session state
    pub extracted: Extracted,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }

    /// Result for a request the transport never completed
    pub fn transport_failure(task: &'static str, elapsed: Duration) -> Self {
        Self {
            task,
            outcome: Outcome::Failure(FailureReason::Transport),
            elapsed,
            extracted: Extracted::None,
        }
    }
}

/// Classifier applying the SLA-first decision order
#[derive(Debug, Clone, Copy)]
pub struct OutcomeClassifier {
    sla: Duration,
}

impl OutcomeClassifier {
    /// Create a classifier with the global maximum acceptable response time
    pub fn new(sla: Duration) -> Self {
        Self { sla }
    }

    /// Classify a completed response for a task.
    ///
    /// `expected_status` is the task's success code (200 for every task in
    /// the stock table); `extraction` names the field the body must carry.
    pub fn classify(
        &self,
        task: &'static str,
        expected_status: u16,
        extraction: Extraction,
        response: &HttpResponse,
    ) -> TaskResult {
        let failure = |reason| TaskResult {
            task,
            outcome: Outcome::Failure(reason),
            elapsed: response.elapsed,
            extracted: Extracted::None,
        };

        if response.elapsed > self.sla {
            return failure(FailureReason::ResponseTimeExceeded);
        }
        if response.status != expected_status {
            return failure(FailureReason::UnexpectedStatusCode(response.status));
        }
        match extract(extraction, &response.body) {
            Some(extracted) => TaskResult {
                task,
                outcome: Outcome::Success,
                elapsed: response.elapsed,
                extracted,
            },
            None => failure(FailureReason::MalformedResponse),
        }
    }
}

fn extract(extraction: Extraction, body: &str) -> Option<Extracted> {
    match extraction {
        Extraction::None => Some(Extracted::None),
        Extraction::AccessToken => {
            let value: serde_json::Value = serde_json::from_str(body).ok()?;
            let token = value.get("access_token")?.as_str()?;
            Some(Extracted::Token(token.to_string()))
        }
        Extraction::Catalog => {
            let products: Vec<Product> = serde_json::from_str(body).ok()?;
            Some(Extracted::Catalog(products))
        }
        Extraction::CartId => {
            let value: serde_json::Value = serde_json::from_str(body).ok()?;
            let cart_id = value.get("cart_id")?.as_i64()?;
            Some(Extracted::CartId(cart_id))
        }
    }
}
