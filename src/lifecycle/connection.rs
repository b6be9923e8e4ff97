//! Log-storage connection lifecycle for one batch.
//!
//! # States
//! ```text
//! Unopened → Open → CloseScheduled → Closed
//! ```
//!
//! # Close Gating
//! Every attempt, probe or escalated, holds an [`AttemptGuard`] from the
//! moment it is created until its outcome has been logged. A probe waiting
//! for a concurrency permit is queued; it counts as in flight but has not
//! started yet.
//!
//! The connection is closed only after the in-flight count has reached zero
//! and the grace delay has passed. The drain timeout starts once the queue
//! is empty, so it bounds the tail of the batch, never its length.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time;
use crate::store::{LogStore, StoreError};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unopened = 0,
    Open = 1,
    CloseScheduled = 2,
    Closed = 3,
}

impl From<u8> for ConnectionState {
    fn from(val: u8) -> Self {
        match val {
            1 => ConnectionState::Open,
            2 => ConnectionState::CloseScheduled,
            3 => ConnectionState::Closed,
            _ => ConnectionState::Unopened,
        }
    }
}

#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    queued: AtomicUsize,
    changed: Notify,
}

impl InFlight {
    fn release(counter: &AtomicUsize, changed: &Notify) {
        if counter.fetch_sub(1, Ordering::AcqRel) == 1 {
            changed.notify_waiters();
        }
    }
}

/// Owns the shared store connection for one batch run.
pub struct ConnectionLifecycle {
    store: Arc<dyn LogStore>,
    state: AtomicU8,
    in_flight: Arc<InFlight>,
    drain_timeout: Duration,
}

impl ConnectionLifecycle {
    pub fn new(store: Arc<dyn LogStore>, drain_timeout: Duration) -> Self {
        Self {
            store,
            state: AtomicU8::new(ConnectionState::Unopened as u8),
            in_flight: Arc::new(InFlight::default()),
            drain_timeout,
        }
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::Acquire))
    }

    /// Attempts created but not yet logged.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::Acquire)
    }

    /// Open the store. Only valid once, from `Unopened`.
    pub async fn open(&self) -> Result<(), StoreError> {
        if self.state() != ConnectionState::Unopened {
            tracing::warn!(state = ?self.state(), "Connection already opened for this batch");
            return Ok(());
        }
        self.store.open().await?;
        self.state.store(ConnectionState::Open as u8, Ordering::Release);
        tracing::debug!("Log store connection open");
        Ok(())
    }

    /// Attempts registered but not yet started.
    pub fn queued(&self) -> usize {
        self.in_flight.queued.load(Ordering::Acquire)
    }

    /// Register an attempt that is already running. The count drops when
    /// the guard is dropped.
    pub fn begin_attempt(&self) -> AttemptGuard {
        self.in_flight.count.fetch_add(1, Ordering::AcqRel);
        AttemptGuard {
            in_flight: self.in_flight.clone(),
            queued: false,
        }
    }

    /// Register an attempt that still has to wait its turn. Call
    /// [`AttemptGuard::start`] once it runs.
    pub fn queue_attempt(&self) -> AttemptGuard {
        self.in_flight.count.fetch_add(1, Ordering::AcqRel);
        self.in_flight.queued.fetch_add(1, Ordering::AcqRel);
        AttemptGuard {
            in_flight: self.in_flight.clone(),
            queued: true,
        }
    }

    /// Move `Open → CloseScheduled`. Returns false if a close was already
    /// scheduled, the connection is closed, or it was never opened.
    pub fn schedule_close(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Open as u8,
                ConnectionState::CloseScheduled as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    async fn wait_until_zero(&self, counter: &AtomicUsize) {
        loop {
            let notified = self.in_flight.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if counter.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Wait until no attempt is in flight. Returns false on drain timeout.
    ///
    /// Queued attempts are waited for without a bound; each one is bounded
    /// by its own request deadline once it starts.
    pub async fn wait_drained(&self) -> bool {
        self.wait_until_zero(&self.in_flight.queued).await;
        time::timeout(self.drain_timeout, self.wait_until_zero(&self.in_flight.count))
            .await
            .is_ok()
    }

    /// Schedule the close, drain, wait `grace`, then close the store.
    ///
    /// Returns whether every attempt was drained before closing. A second
    /// call while a close is scheduled or done is a no-op returning true.
    pub async fn finish(&self, grace: Duration) -> bool {
        if !self.schedule_close() {
            tracing::debug!(state = ?self.state(), "Close already scheduled, ignoring");
            return true;
        }

        let drained = self.wait_drained().await;
        if !drained {
            tracing::warn!(
                in_flight = self.in_flight(),
                timeout_ms = self.drain_timeout.as_millis() as u64,
                "Drain timeout reached, closing log store with attempts still in flight"
            );
        }

        if !grace.is_zero() {
            time::sleep(grace).await;
        }

        if let Err(e) = self.store.close().await {
            tracing::error!(error = %e, "Failed to close log store");
        }
        self.state.store(ConnectionState::Closed as u8, Ordering::Release);
        tracing::debug!("Log store connection closed");
        drained
    }
}

/// Keeps one attempt counted as in flight.
#[derive(Debug)]
pub struct AttemptGuard {
    in_flight: Arc<InFlight>,
    queued: bool,
}

impl AttemptGuard {
    /// Mark a queued attempt as running. No-op on a running attempt.
    pub fn start(&mut self) {
        if std::mem::take(&mut self.queued) {
            InFlight::release(&self.in_flight.queued, &self.in_flight.changed);
        }
    }
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        self.start();
        InFlight::release(&self.in_flight.count, &self.in_flight.changed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLogStore;

    fn lifecycle(store: Arc<MemoryLogStore>) -> ConnectionLifecycle {
        ConnectionLifecycle::new(store, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let store = Arc::new(MemoryLogStore::new());
        let conn = lifecycle(store.clone());
        assert_eq!(conn.state(), ConnectionState::Unopened);
        assert!(!conn.schedule_close());

        conn.open().await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Open);
        assert!(store.is_open());

        assert!(conn.finish(Duration::ZERO).await);
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(!store.is_open());
    }

    #[tokio::test]
    async fn test_close_is_scheduled_once() {
        let store = Arc::new(MemoryLogStore::new());
        let conn = Arc::new(lifecycle(store.clone()));
        conn.open().await.unwrap();

        let first = tokio::spawn({
            let conn = conn.clone();
            async move { conn.finish(Duration::from_millis(20)).await }
        });
        let second = tokio::spawn({
            let conn = conn.clone();
            async move { conn.finish(Duration::from_millis(20)).await }
        });
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(store.close_count(), 1);
        assert!(conn.finish(Duration::ZERO).await);
        assert_eq!(store.close_count(), 1);
    }

    #[tokio::test]
    async fn test_close_waits_for_in_flight_attempts() {
        let store = Arc::new(MemoryLogStore::new());
        let conn = Arc::new(lifecycle(store.clone()));
        conn.open().await.unwrap();

        let guard = conn.begin_attempt();
        let escalated = conn.begin_attempt();
        assert_eq!(conn.in_flight(), 2);

        let closer = tokio::spawn({
            let conn = conn.clone();
            async move { conn.finish(Duration::ZERO).await }
        });

        drop(guard);
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(conn.state(), ConnectionState::CloseScheduled);
        assert!(store.is_open());

        drop(escalated);
        assert!(closer.await.unwrap());
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(conn.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_drain_timeout_still_closes() {
        let store = Arc::new(MemoryLogStore::new());
        let conn = ConnectionLifecycle::new(store.clone(), Duration::from_millis(30));
        conn.open().await.unwrap();

        let _stuck = conn.begin_attempt();
        assert!(!conn.finish(Duration::ZERO).await);
        assert_eq!(store.close_count(), 1);
    }

    #[tokio::test]
    async fn test_close_waits_out_the_grace_delay() {
        let store = Arc::new(MemoryLogStore::new());
        let conn = Arc::new(lifecycle(store.clone()));
        conn.open().await.unwrap();

        let guard = conn.begin_attempt();
        let closer = tokio::spawn({
            let conn = conn.clone();
            async move { conn.finish(Duration::from_millis(100)).await }
        });

        time::sleep(Duration::from_millis(20)).await;
        let last_completion = time::Instant::now();
        drop(guard);

        time::sleep(Duration::from_millis(50)).await;
        assert!(store.is_open());
        assert_eq!(store.close_count(), 0);
        assert_eq!(conn.state(), ConnectionState::CloseScheduled);

        assert!(closer.await.unwrap());
        assert!(last_completion.elapsed() >= Duration::from_millis(100));
        assert_eq!(store.close_count(), 1);
        assert!(!store.is_open());
    }

    #[tokio::test]
    async fn test_drain_timeout_starts_when_queue_empties() {
        let store = Arc::new(MemoryLogStore::new());
        let conn = Arc::new(ConnectionLifecycle::new(store.clone(), Duration::from_millis(50)));
        conn.open().await.unwrap();

        let mut waiting = conn.queue_attempt();
        assert_eq!(conn.queued(), 1);
        let closer = tokio::spawn({
            let conn = conn.clone();
            async move { conn.finish(Duration::ZERO).await }
        });

        // Queued far longer than the drain timeout.
        time::sleep(Duration::from_millis(150)).await;
        assert!(store.is_open());

        waiting.start();
        assert_eq!(conn.queued(), 0);
        assert_eq!(conn.in_flight(), 1);
        time::sleep(Duration::from_millis(10)).await;
        drop(waiting);

        assert!(closer.await.unwrap());
        assert_eq!(store.close_count(), 1);
    }

    #[tokio::test]
    async fn test_dropping_a_queued_attempt_releases_both_counts() {
        let store = Arc::new(MemoryLogStore::new());
        let conn = lifecycle(store);

        let queued = conn.queue_attempt();
        assert_eq!((conn.queued(), conn.in_flight()), (1, 1));
        drop(queued);
        assert_eq!((conn.queued(), conn.in_flight()), (0, 0));
    }
}
