//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap outbound requests with a deadline covering headers and body
//! - Turn an expired deadline into a transport failure
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - The dropped future cancels the request

use std::future::Future;
use std::time::Duration;
use tokio::time;
use crate::probe::ProbeError;

/// Run `fut` to completion or fail with [`ProbeError::Timeout`].
pub async fn with_deadline<F, T>(deadline: Duration, fut: F) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProbeError>>,
{
    match time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(deadline.as_millis() as u64)),
    }
}
