//! Request execution.
//!
//! # Responsibilities
//! - Send one request (HEAD for probes, GET for escalations) to a target
//! - Read the entire response body before reporting an outcome
//! - Classify failures that never produce a response
//!
//! # Design Decisions
//! - The executor is a trait so the dispatcher can run without a network
//! - A partial body is a failure, never an outcome
//! - Probes connect directly; system proxies are ignored

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use crate::probe::attempt::{Outcome, ProbeError, ProbeMethod, ProbeResult};
use crate::resilience::timeouts::with_deadline;
use crate::target::MonitorTarget;

/// Sends a single request and waits for the full response.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, method: ProbeMethod, target: &MonitorTarget) -> ProbeResult;
}

/// HTTP(S) executor backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    request_timeout: Duration,
}

impl HttpExecutor {
    pub fn new(request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("nines-pinger/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()?;

        Ok(Self::with_client(client, request_timeout))
    }

    pub fn with_client(client: Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    async fn send(&self, method: ProbeMethod, target: &MonitorTarget) -> ProbeResult {
        let url = target.url().map_err(|e| ProbeError::InvalidUrl {
            url: target.full_url(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .request(method.http_method(), url)
            .send()
            .await
            .map_err(classify)?;

        let status_code = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| ProbeError::Body(e.to_string()))?;

        Ok(Outcome { status_code, body })
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, method: ProbeMethod, target: &MonitorTarget) -> ProbeResult {
        tracing::debug!(
            target_name = %target.name,
            url = %target.full_url(),
            method = %method.http_method(),
            "Sending request"
        );

        with_deadline(self.request_timeout, self.send(method, target)).await
    }
}

fn classify(err: reqwest::Error) -> ProbeError {
    if err.is_connect() {
        ProbeError::Connect(err.to_string())
    } else if err.is_body() || err.is_decode() {
        ProbeError::Body(err.to_string())
    } else {
        ProbeError::Request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Protocol;

    #[tokio::test]
    async fn test_invalid_url_fails_before_sending() {
        let executor = HttpExecutor::new(Duration::from_secs(1)).unwrap();
        let target = MonitorTarget::new("bad", "exa mple.test", "/", Protocol::Http);

        let result = executor.execute(ProbeMethod::Probe, &target).await;
        assert!(matches!(result, Err(ProbeError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_transport_failure() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let executor = HttpExecutor::new(Duration::from_secs(2)).unwrap();
        let target = MonitorTarget::http("gone", addr.to_string(), "/");

        let err = executor.execute(ProbeMethod::Probe, &target).await.unwrap_err();
        assert_eq!(err.kind(), "connect");
    }
}
