//! Batch URL health-check dispatcher.

pub mod config;
pub mod dispatcher;
pub mod lifecycle;
pub mod observability;
pub mod outcome;
pub mod probe;
pub mod resilience;
pub mod scheduler;
pub mod store;
pub mod target;

pub use config::PingerConfig;
pub use dispatcher::{BatchDispatcher, BatchSummary, DispatchSettings};
pub use lifecycle::Shutdown;
pub use target::{MonitorTarget, Protocol};
