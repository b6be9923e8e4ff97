//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, logger and lifecycle produce:
//!     → logging.rs (structured diagnostics via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Every batch runs inside a span carrying its run ID
//! - Diagnostics for skipped targets are warnings, never errors returned to callers
//! - Metrics are cheap and recorded unconditionally

pub mod logging;
pub mod metrics;
