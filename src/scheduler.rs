//! Repeated batches.
//!
//! # Responsibilities
//! - Run one batch per interval tick over the same target list
//! - Stop between batches when shutdown is signalled
//!
//! # Design Decisions
//! - A running batch is never interrupted; it drains and closes its store first
//! - Slow batches delay the next tick instead of overlapping it

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use crate::dispatcher::{BatchDispatcher, BatchSummary};
use crate::target::MonitorTarget;

pub struct BatchScheduler {
    dispatcher: BatchDispatcher,
    targets: Vec<MonitorTarget>,
    interval: Duration,
}

impl BatchScheduler {
    pub fn new(dispatcher: BatchDispatcher, targets: Vec<MonitorTarget>, interval: Duration) -> Self {
        Self {
            dispatcher,
            targets,
            interval,
        }
    }

    /// Run a single batch, tracing a store failure instead of returning it.
    pub async fn run_once(&self) -> Option<BatchSummary> {
        match self.dispatcher.run(self.targets.clone()).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::error!(error = %e, "Could not open log store, batch skipped");
                None
            }
        }
    }

    /// Tick until shutdown. Returns the number of batches started.
    ///
    /// A zero interval runs a single batch and returns.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> usize {
        if self.interval.is_zero() {
            tracing::info!("No batch interval configured, running once");
            self.run_once().await;
            return 1;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            targets = self.targets.len(),
            "Batch scheduler starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut batches = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    batches += 1;
                    self.run_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!(batches, "Batch scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::dispatcher::DispatchSettings;
    use crate::lifecycle::Shutdown;
    use crate::probe::{Outcome, ProbeMethod, ProbeResult, RequestExecutor};
    use crate::store::MemoryLogStore;
    use async_trait::async_trait;

    struct AlwaysOk;

    #[async_trait]
    impl RequestExecutor for AlwaysOk {
        async fn execute(&self, _: ProbeMethod, _: &MonitorTarget) -> ProbeResult {
            Ok(Outcome::new(200, ""))
        }
    }

    #[tokio::test]
    async fn test_one_connection_per_batch_until_shutdown() {
        let store = Arc::new(MemoryLogStore::new());
        let mut settings = DispatchSettings::default();
        settings.close_grace = Duration::ZERO;
        let dispatcher = BatchDispatcher::new(Arc::new(AlwaysOk), store.clone(), settings);
        let scheduler = BatchScheduler::new(
            dispatcher,
            vec![MonitorTarget::http("a", "a.test", "/")],
            Duration::from_millis(20),
        );

        let shutdown = Shutdown::new();
        let handle = tokio::spawn(scheduler.run(shutdown.subscribe()));
        time::sleep(Duration::from_millis(110)).await;
        shutdown.trigger();
        let batches = handle.await.unwrap();

        assert!(batches >= 2);
        assert_eq!(store.open_count(), batches);
        assert_eq!(store.close_count(), batches);
        assert_eq!(store.events().len(), batches);
        assert!(!store.is_open());
    }

    #[tokio::test]
    async fn test_zero_interval_runs_a_single_batch() {
        let store = Arc::new(MemoryLogStore::new());
        let mut settings = DispatchSettings::default();
        settings.close_grace = Duration::ZERO;
        let dispatcher = BatchDispatcher::new(Arc::new(AlwaysOk), store.clone(), settings);
        let scheduler = BatchScheduler::new(
            dispatcher,
            vec![MonitorTarget::http("a", "a.test", "/")],
            Duration::ZERO,
        );

        // Never triggered; the scheduler must return on its own.
        let shutdown = Shutdown::new();
        let batches = time::timeout(Duration::from_secs(10), scheduler.run(shutdown.subscribe()))
            .await
            .unwrap();

        assert_eq!(batches, 1);
        assert_eq!(store.close_count(), 1);
        assert_eq!(store.events().len(), 1);
    }
}
