//! Outcome logging.
//!
//! Probe results go to the event log, escalated results to the error log.
//! Both sinks share the batch's store connection. A failed write is traced
//! and counted, never returned: callers only learn that the write finished.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::observability::metrics;
use crate::probe::{ProbeAttempt, ProbeResult};
use crate::store::{ErrorLogEntry, EventLogEntry, LogStore};

#[derive(Clone)]
pub struct OutcomeLogger {
    store: Arc<dyn LogStore>,
    run_id: Uuid,
}

impl OutcomeLogger {
    pub fn new(store: Arc<dyn LogStore>, run_id: Uuid) -> Self {
        Self { store, run_id }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Build the event entry for a probe result.
    pub fn event_entry(&self, attempt: &ProbeAttempt, result: &ProbeResult) -> EventLogEntry {
        let target = &attempt.target;
        let result_line = match result {
            Ok(outcome) => format!("response code: {}", outcome.status_code),
            Err(e) => format!("transport error: {}", e),
        };

        EventLogEntry {
            run_id: self.run_id,
            timestamp: attempt.requested_at,
            event_type: format!("{} request", target.protocol),
            description: format!(
                "name: {}\nhost: {}\npath: {}\n{}",
                target.name, target.host, target.path, result_line
            ),
        }
    }

    /// Record a probe result in the event log.
    pub async fn log_event(&self, attempt: &ProbeAttempt, result: &ProbeResult) {
        let entry = self.event_entry(attempt, result);
        if let Err(e) = self.store.write_event(&entry).await {
            metrics::record_write_failure("event");
            tracing::error!(
                target_name = %attempt.target.name,
                error = %e,
                "Failed to write event log entry"
            );
        }
    }

    /// Record an escalated result, with the full body, in the error log.
    pub async fn log_error(
        &self,
        status_code: Option<u16>,
        target_name: &str,
        full_url: &str,
        timestamp: DateTime<Utc>,
        body: &[u8],
    ) {
        let entry = ErrorLogEntry {
            run_id: self.run_id,
            status_code,
            target_name: target_name.to_string(),
            full_url: full_url.to_string(),
            timestamp,
            body: String::from_utf8_lossy(body).into_owned(),
        };

        if let Err(e) = self.store.write_error(&entry).await {
            metrics::record_write_failure("error");
            tracing::error!(
                target_name = %target_name,
                url = %full_url,
                error = %e,
                "Failed to write error log entry"
            );
        }
    }
}
