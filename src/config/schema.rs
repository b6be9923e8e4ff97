//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pinger.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration for the pinger.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PingerConfig {
    /// Probe and escalation settings.
    pub probe: ProbeConfig,

    /// Per-protocol capabilities.
    pub protocols: ProtocolConfig,

    /// Log-storage connection lifecycle.
    pub connection: ConnectionConfig,

    /// Log storage backend.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Batch scheduling.
    pub schedule: ScheduleConfig,

    /// Monitored endpoints, in batch order.
    pub targets: Vec<TargetConfig>,
}

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Inclusive lower bound on probe status codes that trigger escalation.
    pub status_code_threshold: u16,

    /// Deadline for a single request, including the full body read.
    pub request_timeout_ms: u64,

    /// Maximum number of targets probed at once.
    pub max_concurrency: usize,

    /// What to do when a probe never gets a response.
    pub transport_failure: TransportFailurePolicy,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            status_code_threshold: 400,
            request_timeout_ms: 10_000,
            max_concurrency: 64,
            transport_failure: TransportFailurePolicy::Record,
        }
    }
}

impl ProbeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Handling of probes that fail below the HTTP layer (refused, DNS, timeout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportFailurePolicy {
    /// Write an event entry describing the failure.
    #[default]
    Record,
    /// Write the event entry and issue the escalated request.
    Escalate,
    /// Emit a diagnostic only.
    Drop,
}

/// Protocol capabilities.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Probe `https` targets instead of skipping them.
    pub https_enabled: bool,

    /// Apply escalation to `https` targets as well.
    pub escalate_https: bool,
}

/// Connection lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Wait between the last logged attempt and closing the store.
    pub close_grace_ms: u64,

    /// Upper bound on waiting for in-flight attempts before closing anyway.
    pub drain_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            close_grace_ms: 2_000,
            drain_timeout_ms: 60_000,
        }
    }
}

impl ConnectionConfig {
    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

/// Log storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend kind.
    pub kind: StoreKind,

    /// Directory holding `events.jsonl` and `errors.jsonl`.
    pub directory: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Jsonl,
            directory: "nines-logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Jsonl,
    Memory,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics listener.
    pub metrics_enabled: bool,

    /// Metrics listener bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Batch scheduling.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between batches; 0 runs a single batch.
    pub interval_secs: u64,
}

/// A monitored endpoint as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Display name used in log entries.
    pub name: String,

    /// Host, optionally with port (e.g., "example.com:8080").
    pub host: String,

    /// Request path.
    #[serde(default = "default_path")]
    pub path: String,

    /// "http", "https", or anything else (skipped at dispatch).
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_path() -> String {
    "/".to_string()
}

fn default_protocol() -> String {
    "http".to_string()
}
