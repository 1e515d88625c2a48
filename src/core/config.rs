//! # Lifecycle manager configuration.
//!
//! Provides [`LifecycleConfig`], the settings shared by every operation of a
//! [`RoomLifecycleManager`](crate::RoomLifecycleManager).
//!
//! Config is used in two places:
//! 1. **Builder**: `RoomLifecycleManager::builder(contributors).with_config(cfg)`
//! 2. **Operations**: retry pauses, transient-disconnect grace period,
//!    contributor state stream buffering.

use std::time::Duration;

use crate::{policies::BackoffPolicy, subscription::BufferingPolicy};

/// Configuration for a room lifecycle manager.
///
/// ## Field semantics
/// - `transient_disconnect_timeout`: grace period after a contributor reports
///   `ATTACHING` outside of any operation before the room itself becomes attaching
/// - `detach_retry`: pause between detach attempts of the same contributor
/// - `contributor_state_buffering`: buffering of the manager's subscription to
///   each contributor's state-change stream
#[derive(Clone, Debug)]
pub struct LifecycleConfig {
    /// Grace period that suppresses status churn for brief reconnects.
    pub transient_disconnect_timeout: Duration,

    /// Pause policy for detach-until-success loops.
    pub detach_retry: BackoffPolicy,

    /// Buffering of contributor state-change subscriptions.
    ///
    /// Dropping state changes breaks the reactive handler's assumptions; keep
    /// this unbounded unless the transport guarantees low volume.
    pub contributor_state_buffering: BufferingPolicy,
}

impl Default for LifecycleConfig {
    /// Default configuration:
    ///
    /// - `transient_disconnect_timeout = 5s`
    /// - `detach_retry = BackoffPolicy::default()` (constant 250ms)
    /// - `contributor_state_buffering = Unbounded`
    fn default() -> Self {
        Self {
            transient_disconnect_timeout: Duration::from_secs(5),
            detach_retry: BackoffPolicy::default(),
            contributor_state_buffering: BufferingPolicy::Unbounded,
        }
    }
}
