//! # Clock abstraction.
//!
//! The manager never calls `tokio::time` directly; every pause (transient
//! disconnect grace period, detach retry pause) goes through a [`Clock`] so
//! that it can be substituted.
//!
//! [`TokioClock`] is the default and is backed by [`tokio::time::sleep`],
//! which means tests can drive it with tokio's paused time.

use std::time::Duration;

use async_trait::async_trait;

/// Source of pauses.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Suspends the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let start = tokio::time::Instant::now();
        TokioClock.sleep(Duration::from_secs(5)).await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
