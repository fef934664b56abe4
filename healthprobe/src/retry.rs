//! Bounded retries with exponential backoff.

use tokio::time::Duration;
use tracing::{debug, warn};

use crate::cancel::Cancel;
use crate::endpoint::Endpoint;
use crate::probe::Prober;
use crate::result::CheckResult;

/// Error reported when the shared handle fires during a backoff wait.
pub const CANCELLED: &str = "check cancelled";

/// Longest wait between two attempts.
pub const MAX_BACKOFF: Duration = Duration::from_secs(1 << 32);

/// The wait before attempt `attempt`: nothing before the first, then 1s, 2s, 4s, ...
/// up to [`MAX_BACKOFF`].
pub fn backoff(attempt: u32) -> Duration {
    match attempt {
        0 => Duration::ZERO,
        n => 1u64
            .checked_shl(n - 1)
            .map(Duration::from_secs)
            .filter(|wait| *wait <= MAX_BACKOFF)
            .unwrap_or(MAX_BACKOFF),
    }
}

/// Probe `endpoint` up to `retries + 1` times and return the last attempt.
///
/// Returns as soon as an attempt is healthy. Between attempts it sleeps for
/// [`backoff`]; if `cancel` fires during that sleep the previous attempt is
/// returned marked with [`CANCELLED`] and nothing else is tried. A probe
/// already in flight is bounded by its own timeout, not by this loop.
pub async fn check_with_retry<P>(
    prober: &P,
    cancel: &Cancel,
    endpoint: &Endpoint,
    retries: u32,
) -> CheckResult
where
    P: Prober + ?Sized,
{
    let mut last = CheckResult::begin(endpoint);

    for attempt in 0..=retries {
        if attempt > 0 {
            let wait = backoff(attempt);
            debug!(endpoint = %endpoint.name, attempt, ?wait, "backing off before retry");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(endpoint = %endpoint.name, attempt, "retries cancelled");
                    return last.fail(CANCELLED);
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }

        last = prober.probe(endpoint, cancel).await;
        last.retries = attempt;

        if last.healthy {
            return last;
        }

        debug!(endpoint = %endpoint.name, attempt, error = %last.error, "attempt failed");
    }

    last
}
