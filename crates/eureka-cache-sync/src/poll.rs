//! The polling cadence shared by every sync driver.
//!
//! A driver owns a [`PollTicker`] and runs one cycle per tick:
//!
//! ```rust,ignore
//! let mut ticker = PollTicker::new(interval, cancel);
//! while ticker.tick().await {
//!     log_cycle(&session.run_cycle().await);
//! }
//! ```

use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::protocol::SyncReport;

/// Fires once immediately, then every poll interval, until cancelled.
///
/// Ticks missed while a slow cycle runs are not replayed; the next tick is
/// scheduled one full interval after the late one.
pub struct PollTicker {
    ticker: Interval,
    cancel: CancellationToken,
}

impl PollTicker {
    pub fn new(period: Duration, cancel: CancellationToken) -> Self {
        let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?period, "registry polling started");
        Self { ticker, cancel }
    }

    /// Wait for the next tick. Returns `false` once cancelled.
    ///
    /// Cancellation wins over a tick that is already due.
    pub async fn tick(&mut self) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                info!("registry polling stopped");
                false
            }
            _ = self.ticker.tick() => true,
        }
    }
}

/// Log the outcome of one cycle. A failed cycle keeps the current snapshot.
pub fn log_cycle(result: &Result<SyncReport>) {
    match result {
        Ok(report) => debug!(?report, "sync cycle complete"),
        Err(e) => warn!(error = %e, "sync cycle failed, keeping current snapshot"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_tick() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut ticker = PollTicker::new(Duration::from_secs(30), cancel);
        assert!(!ticker.tick().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_immediately_then_every_period() {
        let cancel = CancellationToken::new();
        let mut ticker = PollTicker::new(Duration::from_secs(30), cancel.clone());
        let start = Instant::now();

        assert!(ticker.tick().await);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(ticker.tick().await);
        assert_eq!(start.elapsed(), Duration::from_secs(30));

        cancel.cancel();
        assert!(!ticker.tick().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_clamped() {
        let mut ticker = PollTicker::new(Duration::ZERO, CancellationToken::new());
        let start = Instant::now();
        assert!(ticker.tick().await);
        assert!(ticker.tick().await);
        assert_eq!(start.elapsed(), Duration::from_millis(1));
    }
}
