//! Log storage subsystem.
//!
//! # Data Flow
//! ```text
//! OutcomeLogger
//!     → write_event (one EventLogEntry per probe)
//!     → write_error (one ErrorLogEntry per escalated attempt)
//!     → LogStore implementation:
//!         - memory.rs (in-process, inspection and dry runs)
//!         - jsonl.rs (events.jsonl / errors.jsonl on disk)
//! ```
//!
//! # Design Decisions
//! - One connection per batch: open before the first attempt, close after the last write
//! - Writes on a store that is not open fail with `NotOpen` instead of panicking
//! - Entries are plain serde types; the store decides the encoding

pub mod jsonl;
pub mod memory;

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{StoreConfig, StoreKind};

pub use jsonl::JsonlLogStore;
pub use memory::MemoryLogStore;

/// General log record, one per probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub description: String,
}

/// Error log record, one per escalated attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub run_id: Uuid,
    /// `None` when the escalated request itself got no response.
    pub status_code: Option<u16>,
    pub target_name: String,
    pub full_url: String,
    pub timestamp: DateTime<Utc>,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("entry could not be encoded: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store connection is not open")]
    NotOpen,
}

/// Connection-oriented sink for probe results.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn open(&self) -> Result<(), StoreError>;
    async fn close(&self) -> Result<(), StoreError>;
    async fn write_event(&self, entry: &EventLogEntry) -> Result<(), StoreError>;
    async fn write_error(&self, entry: &ErrorLogEntry) -> Result<(), StoreError>;
}

/// Build the configured store.
pub fn build_store(config: &StoreConfig) -> Arc<dyn LogStore> {
    match config.kind {
        StoreKind::Jsonl => Arc::new(JsonlLogStore::new(&config.directory)),
        StoreKind::Memory => Arc::new(MemoryLogStore::new()),
    }
}
