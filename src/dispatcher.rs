//! Batch dispatch.
//!
//! # Responsibilities
//! - Open the batch's store connection before any attempt exists
//! - Fan out one probe task per accepted target, bounded by a semaphore
//! - Escalate failing probes and log every outcome
//! - Close the connection once every attempt has been logged
//!
//! # Design Decisions
//! - Skipped targets still occupy their index in the batch
//! - Per-target problems are traced, never returned to the caller
//! - Escalation runs alongside the probe's event write under its own guard

use std::sync::Arc;
use std::time::{Duration, Instant};
use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;
use crate::config::{PingerConfig, TransportFailurePolicy};
use crate::lifecycle::{AttemptGuard, ConnectionLifecycle};
use crate::observability::metrics;
use crate::outcome::OutcomeLogger;
use crate::probe::{EscalationPolicy, ProbeAttempt, ProbeMethod, RequestExecutor};
use crate::store::{LogStore, StoreError};
use crate::target::{MonitorTarget, Protocol};

/// Knobs for one dispatcher, usually taken from [`PingerConfig`].
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub policy: EscalationPolicy,
    pub https_enabled: bool,
    pub max_concurrency: usize,
    pub close_grace: Duration,
    pub drain_timeout: Duration,
}

impl DispatchSettings {
    pub fn from_config(config: &PingerConfig) -> Self {
        Self {
            policy: EscalationPolicy::from_config(&config.probe, &config.protocols),
            https_enabled: config.protocols.https_enabled,
            max_concurrency: config.probe.max_concurrency,
            close_grace: config.connection.close_grace(),
            drain_timeout: config.connection.drain_timeout(),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_config(&PingerConfig::default())
    }
}

/// Counts for one finished batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub batch_size: usize,
    pub dispatched: usize,
    pub skipped: usize,
    pub escalated: usize,
    pub transport_failures: usize,
    /// False if the store was closed with attempts still in flight.
    pub drained: bool,
}

impl BatchSummary {
    fn new(run_id: Uuid, batch_size: usize) -> Self {
        Self {
            run_id,
            batch_size,
            dispatched: 0,
            skipped: 0,
            escalated: 0,
            transport_failures: 0,
            drained: true,
        }
    }
}

#[derive(Debug, Default)]
struct ProbeReport {
    escalated: bool,
    transport_failure: bool,
}

pub struct BatchDispatcher {
    executor: Arc<dyn RequestExecutor>,
    store: Arc<dyn LogStore>,
    settings: DispatchSettings,
}

impl BatchDispatcher {
    pub fn new(
        executor: Arc<dyn RequestExecutor>,
        store: Arc<dyn LogStore>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            executor,
            store,
            settings,
        }
    }

    /// Probe every target once and log the results.
    ///
    /// Fails only if the store cannot be opened.
    pub async fn run(&self, targets: Vec<MonitorTarget>) -> Result<BatchSummary, StoreError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("batch", %run_id, batch_size = targets.len());
        self.run_batch(run_id, targets).instrument(span).await
    }

    async fn run_batch(
        &self,
        run_id: Uuid,
        targets: Vec<MonitorTarget>,
    ) -> Result<BatchSummary, StoreError> {
        let start_time = Instant::now();
        let batch_size = targets.len();
        let mut summary = BatchSummary::new(run_id, batch_size);

        let lifecycle = Arc::new(ConnectionLifecycle::new(
            self.store.clone(),
            self.settings.drain_timeout,
        ));
        lifecycle.open().await?;

        if targets.is_empty() {
            tracing::warn!("No URL data provided, closing log store");
            summary.drained = lifecycle.finish(Duration::ZERO).await;
            return Ok(summary);
        }

        let task = ProbeTask {
            executor: self.executor.clone(),
            logger: OutcomeLogger::new(self.store.clone(), run_id),
            lifecycle: lifecycle.clone(),
            policy: self.settings.policy,
            permits: Arc::new(Semaphore::new(self.settings.max_concurrency.max(1))),
        };

        let mut tasks = JoinSet::new();
        for (index, target) in targets.into_iter().enumerate() {
            if !self.accepts(&target) {
                summary.skipped += 1;
                continue;
            }

            let guard = lifecycle.queue_attempt();
            tasks.spawn(task.clone().run(Arc::new(target), index, batch_size, guard));
            summary.dispatched += 1;
        }
        drop(task);

        summary.drained = lifecycle.finish(self.settings.close_grace).await;
        if !summary.drained {
            tasks.abort_all();
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => {
                    summary.escalated += report.escalated as usize;
                    summary.transport_failures += report.transport_failure as usize;
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::error!(error = %e, "Probe task panicked"),
            }
        }

        metrics::record_batch(start_time);
        tracing::info!(
            dispatched = summary.dispatched,
            skipped = summary.skipped,
            escalated = summary.escalated,
            transport_failures = summary.transport_failures,
            drained = summary.drained,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Batch complete"
        );
        Ok(summary)
    }

    /// Protocol gate. Emits the diagnostic for skipped targets.
    fn accepts(&self, target: &MonitorTarget) -> bool {
        match &target.protocol {
            Protocol::Http => true,
            Protocol::Https if self.settings.https_enabled => true,
            Protocol::Https => {
                tracing::warn!(
                    target_name = %target.name,
                    url = %target.full_url(),
                    "https probing is not enabled, skipping target"
                );
                metrics::record_skipped_target("https_disabled");
                false
            }
            Protocol::Unsupported(protocol) => {
                tracing::warn!(
                    target_name = %target.name,
                    protocol = %protocol,
                    "The specified protocol for the URL {}{} is '{}'. It should be either 'http' or 'https'.",
                    target.host,
                    target.path,
                    protocol
                );
                metrics::record_skipped_target("unsupported_protocol");
                false
            }
        }
    }
}

/// Everything a probe task needs, cloned once per target.
#[derive(Clone)]
struct ProbeTask {
    executor: Arc<dyn RequestExecutor>,
    logger: OutcomeLogger,
    lifecycle: Arc<ConnectionLifecycle>,
    policy: EscalationPolicy,
    permits: Arc<Semaphore>,
}

impl ProbeTask {
    async fn run(
        self,
        target: Arc<MonitorTarget>,
        index: usize,
        batch_size: usize,
        mut guard: AttemptGuard,
    ) -> ProbeReport {
        // The semaphore is never closed.
        let _permit = self.permits.acquire().await.ok();
        guard.start();

        let attempt = ProbeAttempt::probe(target, index, batch_size);
        let result = self.executor.execute(ProbeMethod::Probe, &attempt.target).await;
        let target = &attempt.target;

        metrics::record_probe(target.protocol.as_str(), &result);
        let mut report = ProbeReport::default();
        match &result {
            Ok(outcome) => {
                tracing::debug!(
                    target_name = %target.name,
                    index,
                    status = outcome.status_code,
                    "Probe complete"
                );
            }
            Err(e) => {
                report.transport_failure = true;
                tracing::warn!(
                    target_name = %target.name,
                    url = %target.full_url(),
                    error = %e,
                    "Probe got no response"
                );
            }
        }

        let log_event = async {
            if result.is_ok() || self.policy.transport_failure != TransportFailurePolicy::Drop {
                self.logger.log_event(&attempt, &result).await;
            }
        };

        if self.policy.should_escalate_result(&result, &target.protocol) {
            report.escalated = true;
            let escalation_guard = self.lifecycle.begin_attempt();
            tokio::join!(log_event, self.escalate(attempt.escalate(), escalation_guard));
        } else {
            log_event.await;
        }

        report
    }

    async fn escalate(&self, attempt: ProbeAttempt, _guard: AttemptGuard) {
        let target = &attempt.target;
        let full_url = target.full_url();
        tracing::info!(
            target_name = %target.name,
            url = %full_url,
            "Probe failed, requesting full page"
        );

        let result = self.executor.execute(ProbeMethod::Escalated, target).await;
        metrics::record_escalation(&result);
        match result {
            Ok(outcome) => {
                self.logger
                    .log_error(
                        Some(outcome.status_code),
                        &target.name,
                        &full_url,
                        Utc::now(),
                        &outcome.body,
                    )
                    .await;
            }
            Err(e) => {
                tracing::warn!(
                    target_name = %target.name,
                    url = %full_url,
                    error = %e,
                    "Escalated request got no response"
                );
                if self.policy.transport_failure != TransportFailurePolicy::Drop {
                    let message = e.to_string();
                    self.logger
                        .log_error(None, &target.name, &full_url, Utc::now(), message.as_bytes())
                        .await;
                }
            }
        }
    }
}
