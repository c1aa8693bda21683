//! HTTP transport seam for the load generator
//!
//! The core drives an [`ApiClient`] capability instead of a concrete HTTP
//! library. Implementations must treat non-2xx status codes as data and
//! return them in the [`HttpResponse`]; the `Err` path is reserved for
//! transport-level faults (connection refused, DNS failure, client-side
//! timeout) where no status code ever arrived.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::utils::Stopwatch;

/// HTTP methods used by the simulated tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Raw response handed to the outcome classifier
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code as received
    pub status: u16,
    /// Response body, unparsed
    pub body: String,
    /// Wall-clock time from request issue to full body receipt
    pub elapsed: Duration,
}

/// External HTTP client capability consumed by the core
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Issue a request and return the response with its elapsed time.
    ///
    /// Never errors on non-2xx status codes; `Err` means the transport
    /// itself failed and no response was produced.
    async fn request(
        &self,
        method: Method,
        path: &str,
        json_body: Option<serde_json::Value>,
        headers: &[(String, String)],
    ) -> Result<HttpResponse>;
}

/// Production [`ApiClient`] backed by reqwest
pub struct ReqwestClient {
    base_url: String,
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Build a client against `base_url` with a per-request timeout.
    ///
    /// The timeout is the transport-level ceiling, distinct from the SLA
    /// threshold: requests that outlive it never produce a status code and
    /// classify as transport failures.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            inner,
        })
    }
}

#[async_trait]
impl ApiClient for ReqwestClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        json_body: Option<serde_json::Value>,
        headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, path);
        let stopwatch = Stopwatch::start();

        let mut request = match method {
            Method::Get => self.inner.get(&url),
            Method::Post => self.inner.post(&url),
        };
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = json_body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            body,
            elapsed: stopwatch.elapsed(),
        })
    }
}
