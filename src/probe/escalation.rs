//! Escalation decisions.
//!
//! A probe only carries headers. When its status code reaches the configured
//! threshold a full-body GET is sent to the same target so the error page can
//! be kept for diagnosis.

use crate::config::{ProbeConfig, ProtocolConfig, TransportFailurePolicy};
use crate::probe::attempt::{Outcome, ProbeResult};
use crate::target::Protocol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    /// Inclusive.
    pub threshold: u16,
    pub escalate_https: bool,
    pub transport_failure: TransportFailurePolicy,
}

impl EscalationPolicy {
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold,
            escalate_https: false,
            transport_failure: TransportFailurePolicy::Record,
        }
    }

    pub fn from_config(probe: &ProbeConfig, protocols: &ProtocolConfig) -> Self {
        Self {
            threshold: probe.status_code_threshold,
            escalate_https: protocols.escalate_https,
            transport_failure: probe.transport_failure,
        }
    }

    /// True when a probe outcome warrants a full-body request.
    pub fn should_escalate(&self, outcome: &Outcome, protocol: &Protocol) -> bool {
        outcome.status_code >= self.threshold && self.applies_to(protocol)
    }

    /// Same decision for a probe that may have failed below HTTP.
    pub fn should_escalate_result(&self, result: &ProbeResult, protocol: &Protocol) -> bool {
        match result {
            Ok(outcome) => self.should_escalate(outcome, protocol),
            Err(_) => {
                self.transport_failure == TransportFailurePolicy::Escalate
                    && self.applies_to(protocol)
            }
        }
    }

    fn applies_to(&self, protocol: &Protocol) -> bool {
        match protocol {
            Protocol::Http => true,
            Protocol::Https => self.escalate_https,
            Protocol::Unsupported(_) => false,
        }
    }
}
