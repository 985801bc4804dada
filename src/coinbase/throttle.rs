//! Throttle on REST snapshot fetches.
//!
//! Every resync pulls a full level-3 snapshot, and a flapping feed can ask
//! for them back to back. The throttle admits a short burst (the initial
//! sync plus a few quick gap recoveries) and then refills one permit per
//! period. A session that cannot get a permit within the wait ceiling
//! fails instead, which hands pacing over to the reconnect backoff.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use thiserror::Error;
use tokio::time::timeout;
use tracing::warn;

/// Snapshot fetches admitted without waiting.
const SNAPSHOT_BURST: u32 = 4;

/// One additional permit becomes available per period once the burst is
/// spent.
const REFILL_PERIOD: Duration = Duration::from_secs(15);

/// Longest a session will wait on a permit before giving up.
const MAX_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ThrottleError {
    #[error("no snapshot permit after {waited:?}; feed is resyncing too often")]
    Saturated { waited: Duration },
}

/// Burst-and-refill gate in front of the snapshot endpoint.
pub struct SnapshotThrottle {
    limiter: DefaultDirectRateLimiter,
    max_wait: Duration,
}

impl SnapshotThrottle {
    pub fn new() -> Self {
        Self::with_limits(SNAPSHOT_BURST, REFILL_PERIOD, MAX_WAIT)
    }

    /// `burst` permits up front, one more per `refill`, waiting at most
    /// `max_wait` for one to free up.
    pub fn with_limits(burst: u32, refill: Duration, max_wait: Duration) -> Self {
        let quota = Quota::with_period(refill)
            .expect("refill period must be non-zero")
            .allow_burst(NonZeroU32::new(burst).expect("burst must be non-zero"));
        Self {
            limiter: RateLimiter::direct(quota),
            max_wait,
        }
    }

    /// Obtains a snapshot permit, sleeping until one refills.
    ///
    /// Saturation here means the gap/resync cycle is outrunning the refill
    /// rate; failing the session is deliberate, since the reconnect backoff
    /// is the pressure valve for a feed in that state.
    pub async fn acquire(&self) -> Result<(), ThrottleError> {
        if self.limiter.check().is_err() {
            warn!("snapshot fetch throttled, resyncs are arriving faster than the refill rate");
        }
        timeout(self.max_wait, self.limiter.until_ready())
            .await
            .map_err(|_| ThrottleError::Saturated {
                waited: self.max_wait,
            })
    }
}

impl Default for SnapshotThrottle {
    fn default() -> Self {
        Self::new()
    }
}
