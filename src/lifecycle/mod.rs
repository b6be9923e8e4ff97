//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Per batch (connection.rs):
//!     open store → attempts register guards → schedule close
//!     → drain in-flight → grace delay → close store
//!
//! Process (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Shutdown broadcast → scheduler stops after current batch
//! ```
//!
//! # Design Decisions
//! - One store connection per batch, never shared across batches
//! - Close is gated on a completion count, the grace delay is only extra slack
//! - Drain has a deadline: a hung attempt cannot keep the connection open forever

pub mod connection;
pub mod shutdown;
pub mod signals;

pub use connection::{AttemptGuard, ConnectionLifecycle, ConnectionState};
pub use shutdown::Shutdown;
