//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pinger_probes_total` (counter): probes by protocol and outcome
//! - `pinger_escalations_total` (counter): escalated requests by outcome
//! - `pinger_skipped_targets_total` (counter): targets not probed, by reason
//! - `pinger_log_write_failures_total` (counter): failed store writes by sink
//! - `pinger_batch_duration_seconds` (histogram): batch wall time
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus listener is only started when enabled in config

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::PrometheusBuilder;
use crate::probe::ProbeResult;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics listener started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(protocol: &str, result: &ProbeResult) {
    ::metrics::counter!(
        "pinger_probes_total",
        "protocol" => protocol.to_string(),
        "outcome" => outcome_label(result)
    )
    .increment(1);
}

pub fn record_escalation(result: &ProbeResult) {
    ::metrics::counter!("pinger_escalations_total", "outcome" => outcome_label(result)).increment(1);
}

pub fn record_skipped_target(reason: &'static str) {
    ::metrics::counter!("pinger_skipped_targets_total", "reason" => reason).increment(1);
}

pub fn record_write_failure(sink: &'static str) {
    ::metrics::counter!("pinger_log_write_failures_total", "sink" => sink).increment(1);
}

pub fn record_batch(start_time: Instant) {
    ::metrics::histogram!("pinger_batch_duration_seconds").record(start_time.elapsed().as_secs_f64());
}

/// Status class for a response, error kind for a transport failure.
fn outcome_label(result: &ProbeResult) -> &'static str {
    match result {
        Ok(outcome) => status_class(outcome.status_code),
        Err(e) => e.kind(),
    }
}

fn status_class(code: u16) -> &'static str {
    match code {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
