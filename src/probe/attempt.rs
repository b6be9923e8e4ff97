//! Attempts and their outcomes.

use std::sync::Arc;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Method;
use thiserror::Error;
use crate::target::MonitorTarget;

/// Kind of request sent to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeMethod {
    /// Header-only request sent to every target.
    Probe,
    /// Full-body follow-up after a failing probe.
    Escalated,
}

impl ProbeMethod {
    pub fn http_method(self) -> Method {
        match self {
            ProbeMethod::Probe => Method::HEAD,
            ProbeMethod::Escalated => Method::GET,
        }
    }
}

/// One dispatched request. Lives until its outcome is logged.
#[derive(Debug, Clone)]
pub struct ProbeAttempt {
    pub target: Arc<MonitorTarget>,
    pub method: ProbeMethod,
    pub requested_at: DateTime<Utc>,
    pub target_index: usize,
    pub batch_size: usize,
}

impl ProbeAttempt {
    pub fn probe(target: Arc<MonitorTarget>, target_index: usize, batch_size: usize) -> Self {
        debug_assert!(target_index < batch_size);
        Self {
            target,
            method: ProbeMethod::Probe,
            requested_at: Utc::now(),
            target_index,
            batch_size,
        }
    }

    /// Follow-up for this attempt: same target, fresh timestamp.
    pub fn escalate(&self) -> Self {
        Self {
            target: self.target.clone(),
            method: ProbeMethod::Escalated,
            requested_at: Utc::now(),
            target_index: self.target_index,
            batch_size: self.batch_size,
        }
    }
}

/// A fully received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status_code: u16,
    pub body: Bytes,
}

impl Outcome {
    pub fn new(status_code: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }
}

/// Failures below the HTTP layer. No outcome exists for these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("no complete response within {0} ms")]
    Timeout(u64),

    #[error("response body could not be read: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl ProbeError {
    /// Short label used as the metrics outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::InvalidUrl { .. } => "invalid_url",
            ProbeError::Connect(_) => "connect",
            ProbeError::Timeout(_) => "timeout",
            ProbeError::Body(_) => "body",
            ProbeError::Request(_) => "request",
        }
    }
}

/// Result of executing one attempt.
pub type ProbeResult = Result<Outcome, ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalated_attempt_keeps_position() {
        let target = Arc::new(MonitorTarget::http("home", "a.test", "/"));
        let probe = ProbeAttempt::probe(target, 1, 3);
        let escalated = probe.escalate();

        assert_eq!(escalated.method, ProbeMethod::Escalated);
        assert_eq!(escalated.method.http_method(), Method::GET);
        assert_eq!(escalated.target_index, 1);
        assert_eq!(escalated.batch_size, 3);
        assert!(escalated.requested_at >= probe.requested_at);
    }
}
