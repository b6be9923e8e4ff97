//! In-process log store.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use async_trait::async_trait;
use crate::store::{ErrorLogEntry, EventLogEntry, LogStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    open: bool,
    opens: usize,
    closes: usize,
    events: Vec<EventLogEntry>,
    errors: Vec<ErrorLogEntry>,
    rejected: usize,
}

/// Keeps every entry in memory and counts writes that hit a closed connection.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    state: Mutex<MemoryState>,
    write_delay: Duration,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write waits `delay` before it is applied, like a slow remote store.
    pub fn with_write_delay(delay: Duration) -> Self {
        Self {
            state: Mutex::default(),
            write_delay: delay,
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<EventLogEntry> {
        self.state().events.clone()
    }

    pub fn errors(&self) -> Vec<ErrorLogEntry> {
        self.state().errors.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state().open
    }

    pub fn open_count(&self) -> usize {
        self.state().opens
    }

    pub fn close_count(&self) -> usize {
        self.state().closes
    }

    /// Writes that arrived while the connection was closed.
    pub fn rejected_writes(&self) -> usize {
        self.state().rejected
    }

    async fn apply<F>(&self, write: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut MemoryState),
    {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }

        let mut state = self.state();
        if !state.open {
            state.rejected += 1;
            return Err(StoreError::NotOpen);
        }
        write(&mut state);
        Ok(())
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn open(&self) -> Result<(), StoreError> {
        let mut state = self.state();
        state.open = true;
        state.opens += 1;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut state = self.state();
        if !state.open {
            return Err(StoreError::NotOpen);
        }
        state.open = false;
        state.closes += 1;
        Ok(())
    }

    async fn write_event(&self, entry: &EventLogEntry) -> Result<(), StoreError> {
        let entry = entry.clone();
        self.apply(move |state| state.events.push(entry)).await
    }

    async fn write_error(&self, entry: &ErrorLogEntry) -> Result<(), StoreError> {
        let entry = entry.clone();
        self.apply(move |state| state.errors.push(entry)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn event() -> EventLogEntry {
        EventLogEntry {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type: "http request".into(),
            description: "name: home".into(),
        }
    }

    #[tokio::test]
    async fn test_write_requires_open_connection() {
        let store = MemoryLogStore::new();
        assert!(matches!(store.write_event(&event()).await, Err(StoreError::NotOpen)));
        assert_eq!(store.rejected_writes(), 1);

        store.open().await.unwrap();
        store.write_event(&event()).await.unwrap();
        store.close().await.unwrap();

        assert!(store.write_event(&event()).await.is_err());
        assert_eq!(store.events().len(), 1);
        assert_eq!(store.rejected_writes(), 2);
        assert_eq!((store.open_count(), store.close_count()), (1, 1));
    }

    #[tokio::test]
    async fn test_double_close_is_an_error() {
        let store = MemoryLogStore::new();
        store.open().await.unwrap();
        store.close().await.unwrap();
        assert!(store.close().await.is_err());
        assert_eq!(store.close_count(), 1);
    }
}
