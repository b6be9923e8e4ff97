//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to target:
//!     → timeouts.rs (deadline over send + full body read)
//!     → On expiry: ProbeError::Timeout, handled by the transport failure policy
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every outbound request has a deadline
//! - No retries: a probe is a measurement, not a delivery

pub mod timeouts;
