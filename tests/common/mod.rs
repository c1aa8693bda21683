//! Shared test fixtures: a scripted in-process ApiClient

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use stampede::{ApiClient, Error, HttpResponse, Method, Result};

/// One scripted reply, consumed in order before route defaults apply
pub enum Scripted {
    Respond {
        status: u16,
        body: String,
        elapsed_ms: u64,
    },
    TransportFailure,
}

/// One request the mock observed
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
}

/// Scripted ApiClient for driving sessions without a network.
///
/// Scripted replies are popped first; once the script is empty, requests
/// fall through to route defaults mimicking a healthy target (login hands
/// out a token, browse returns a three-product catalog, cart returns a
/// cart id, order confirms). Every request is recorded.
pub struct MockApiClient {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockApiClient {
    /// A mock with no script: every route answers its healthy default
    pub fn healthy() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn scripted(replies: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    fn default_response(method: Method, path: &str) -> HttpResponse {
        let body = match (method, path) {
            (Method::Post, "/login") => r#"{"access_token": "mock-token"}"#.to_string(),
            (Method::Get, "/products") => r#"[
                {"id": 1, "name": "product_1", "price": 9.99},
                {"id": 2, "name": "product_2", "price": 19.99},
                {"id": 3, "name": "product_3", "price": 29.99}
            ]"#
            .to_string(),
            (Method::Post, "/cart") => r#"{"cart_id": 1}"#.to_string(),
            (Method::Post, "/order") => r#"{"message": "order placed"}"#.to_string(),
            // /products/{id} and anything else
            _ => r#"{"id": 1, "name": "product_1", "price": 9.99}"#.to_string(),
        };
        HttpResponse {
            status: 200,
            body,
            elapsed: Duration::from_millis(5),
        }
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        json_body: Option<serde_json::Value>,
        headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        self.calls.lock().push(RecordedCall {
            method,
            path: path.to_string(),
            body: json_body,
            headers: headers.to_vec(),
        });

        match self.script.lock().pop_front() {
            Some(Scripted::Respond {
                status,
                body,
                elapsed_ms,
            }) => Ok(HttpResponse {
                status,
                body,
                elapsed: Duration::from_millis(elapsed_ms),
            }),
            Some(Scripted::TransportFailure) => {
                Err(Error::Transport("connection refused".into()))
            }
            None => Ok(Self::default_response(method, path)),
        }
    }
}
