//! Probing subsystem.
//!
//! # Data Flow
//! ```text
//! ProbeAttempt (attempt.rs, HEAD)
//!     → executor.rs (send, read full body, deadline)
//!     → Outcome | ProbeError
//!     → escalation.rs (status >= threshold?)
//!         → yes: ProbeAttempt (GET) → executor.rs again
//! ```
//!
//! # Design Decisions
//! - Only probe outcomes are evaluated for escalation
//! - At most one escalated attempt per target per batch

pub mod attempt;
pub mod escalation;
pub mod executor;

pub use attempt::{Outcome, ProbeAttempt, ProbeError, ProbeMethod, ProbeResult};
pub use escalation::EscalationPolicy;
pub use executor::{HttpExecutor, RequestExecutor};
