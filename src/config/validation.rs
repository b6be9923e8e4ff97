//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (threshold is a status code, timeouts > 0)
//! - Reject ambiguous targets (duplicate names, empty hosts)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PingerConfig → Result<(), Vec<ValidationError>>
//! - Unknown target protocols are accepted here; dispatch skips them

use std::collections::HashSet;
use std::net::SocketAddr;
use crate::config::schema::{PingerConfig, StoreKind};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration, collecting every error.
pub fn validate_config(config: &PingerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let threshold = config.probe.status_code_threshold;
    if !(100..=599).contains(&threshold) {
        errors.push(ValidationError::new(
            "probe.status_code_threshold",
            format!("{} is not an HTTP status code", threshold),
        ));
    }
    if config.probe.request_timeout_ms == 0 {
        errors.push(ValidationError::new("probe.request_timeout_ms", "must be greater than 0"));
    }
    if config.probe.max_concurrency == 0 {
        errors.push(ValidationError::new("probe.max_concurrency", "must be greater than 0"));
    }

    if config.connection.drain_timeout_ms < config.connection.close_grace_ms {
        errors.push(ValidationError::new(
            "connection.drain_timeout_ms",
            "must not be shorter than connection.close_grace_ms",
        ));
    }

    // Drain covers a started probe plus its escalation.
    if config.connection.drain_timeout_ms < config.probe.request_timeout_ms.saturating_mul(2) {
        errors.push(ValidationError::new(
            "connection.drain_timeout_ms",
            "must cover a probe and its escalation (2 x probe.request_timeout_ms)",
        ));
    }

    if config.store.kind == StoreKind::Jsonl && config.store.directory.trim().is_empty() {
        errors.push(ValidationError::new("store.directory", "required for the jsonl store"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    let mut names = HashSet::new();
    for (i, target) in config.targets.iter().enumerate() {
        let field = format!("targets[{}]", i);
        if target.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        } else if !names.insert(target.name.as_str()) {
            errors.push(ValidationError::new(
                format!("{}.name", field),
                format!("duplicate target name '{}'", target.name),
            ));
        }
        if target.host.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.host", field), "must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TargetConfig;

    fn target(name: &str, host: &str) -> TargetConfig {
        TargetConfig {
            name: name.into(),
            host: host.into(),
            path: "/".into(),
            protocol: "http".into(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&PingerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = PingerConfig::default();
        config.probe.status_code_threshold = 42;
        config.probe.max_concurrency = 0;
        config.targets.push(target("a", "a.test"));
        config.targets.push(target("a", ""));

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "probe.status_code_threshold",
                "probe.max_concurrency",
                "targets[1].name",
                "targets[1].host",
            ]
        );
    }

    #[test]
    fn test_unknown_protocol_is_not_a_validation_error() {
        let mut config = PingerConfig::default();
        let mut t = target("ftp-box", "files.test");
        t.protocol = "ftp".into();
        config.targets.push(t);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_grace_longer_than_drain_timeout() {
        let mut config = PingerConfig::default();
        config.connection.close_grace_ms = 5_000;
        config.connection.drain_timeout_ms = 1_000;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "connection.drain_timeout_ms");
    }

    #[test]
    fn test_drain_timeout_covers_request_and_escalation() {
        let mut config = PingerConfig::default();
        config.probe.request_timeout_ms = 10_000;
        config.connection.drain_timeout_ms = 15_000;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "connection.drain_timeout_ms");
        assert!(errors[0].message.contains("request_timeout_ms"));

        config.connection.drain_timeout_ms = 20_000;
        assert!(validate_config(&config).is_ok());
    }
}
