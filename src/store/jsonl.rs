//! JSON-lines log store.
//!
//! Opening the store opens `events.jsonl` and `errors.jsonl` under the
//! configured directory in append mode. Each entry is one line, flushed
//! before the write returns.

use std::path::PathBuf;
use async_trait::async_trait;
use serde::Serialize;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use crate::store::{ErrorLogEntry, EventLogEntry, LogStore, StoreError};

pub const EVENTS_FILE: &str = "events.jsonl";
pub const ERRORS_FILE: &str = "errors.jsonl";

#[derive(Debug)]
struct Handles {
    events: File,
    errors: File,
}

#[derive(Debug)]
pub struct JsonlLogStore {
    directory: PathBuf,
    handles: Mutex<Option<Handles>>,
}

impl JsonlLogStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            handles: Mutex::new(None),
        }
    }

    async fn open_append(path: PathBuf) -> Result<File, StoreError> {
        let file = OpenOptions::new().create(true).append(true).open(path).await?;
        Ok(file)
    }
}

async fn append_line<T: Serialize>(file: &mut File, entry: &T) -> Result<(), StoreError> {
    let mut line = serde_json::to_vec(entry)?;
    line.push(b'\n');
    file.write_all(&line).await?;
    file.flush().await?;
    Ok(())
}

#[async_trait]
impl LogStore for JsonlLogStore {
    async fn open(&self) -> Result<(), StoreError> {
        let mut handles = self.handles.lock().await;
        if handles.is_some() {
            return Ok(());
        }

        fs::create_dir_all(&self.directory).await?;
        let events = Self::open_append(self.directory.join(EVENTS_FILE)).await?;
        let errors = Self::open_append(self.directory.join(ERRORS_FILE)).await?;
        *handles = Some(Handles { events, errors });

        tracing::debug!(directory = ?self.directory, "Log store opened");
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut handles = self.handles.lock().await;
        let open = handles.take().ok_or(StoreError::NotOpen)?;
        open.events.sync_all().await?;
        open.errors.sync_all().await?;

        tracing::debug!(directory = ?self.directory, "Log store closed");
        Ok(())
    }

    async fn write_event(&self, entry: &EventLogEntry) -> Result<(), StoreError> {
        let mut handles = self.handles.lock().await;
        let open = handles.as_mut().ok_or(StoreError::NotOpen)?;
        append_line(&mut open.events, entry).await
    }

    async fn write_error(&self, entry: &ErrorLogEntry) -> Result<(), StoreError> {
        let mut handles = self.handles.lock().await;
        let open = handles.as_mut().ok_or(StoreError::NotOpen)?;
        append_line(&mut open.errors, entry).await
    }
}
