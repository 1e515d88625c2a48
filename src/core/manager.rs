//! # RoomLifecycleManager: one consistent status for many contributor channels.
//!
//! The manager owns the room's [`Status`], listens to every contributor's
//! state-change stream and implements the ATTACH / DETACH / RELEASE
//! operations (plus the internally scheduled RETRY and RUNDOWN).
//!
//! ## Architecture
//! ```text
//! Contributor channels                    Room API
//!   c1 ─ state changes ─► listener 1 ─┐     │ attach / detach / release
//!   c2 ─ state changes ─► listener 2 ─┤     ▼
//!   cN ─ state changes ─► listener N ─┤   operation task (spawned)
//!                                     ▼     │
//!                          ┌──────── State (one lock) ────────┐
//!                          │ status, annotations, waiters,    │
//!                          │ status / discontinuity fan-out   │
//!                          └──────────────────────────────────┘
//!                                     │
//!                     RETRY / RUNDOWN tasks, transient timers (spawned)
//! ```
//!
//! ## Rules
//! - User operations run in their own task: dropping the caller's future
//!   does not abandon the operation halfway.
//! - Listeners, scheduled operations and timers are children of the
//!   manager's cancellation token; dropping the manager cancels them.
//! - Contributors are fixed at construction.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    clock::Clock,
    contributor::{Contributor, DiscontinuityEvent, RoomFeature},
    error::RoomError,
    status::{RoomStatus, RoomStatusChange, Status, StatusChange},
    subscription::{BufferingPolicy, Subscription},
};

use super::{
    builder::LifecycleManagerBuilder,
    config::LifecycleConfig,
    state::{Delivery, State},
};

/// State and collaborators shared by the manager, its listeners and its operation tasks.
pub(crate) struct Shared {
    pub(crate) contributors: Vec<Arc<dyn Contributor>>,
    pub(crate) state: Mutex<State>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) cfg: LifecycleConfig,
    pub(crate) token: CancellationToken,
}

impl Shared {
    pub(crate) fn new(
        contributors: Vec<Arc<dyn Contributor>>,
        clock: Arc<dyn Clock>,
        cfg: LifecycleConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::new(contributors.len())),
            contributors,
            clock,
            cfg,
            token: CancellationToken::new(),
        })
    }

    /// Hands discontinuities to their contributors. Call without holding the lock.
    pub(crate) fn deliver(&self, deliveries: Vec<Delivery>) {
        for (index, event) in deliveries {
            let contributor = &self.contributors[index];
            debug!(contributor = %contributor.id(), feature = %contributor.feature(), "emitting discontinuity");
            contributor.emit_discontinuity(event);
        }
    }

    /// Spawns `fut` so that it stops when the manager is torn down.
    pub(crate) fn spawn_scoped<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = fut => {}
            }
        });
    }
}

/// Coordinates the lifecycle of a room's contributors.
///
/// Must be built inside a tokio runtime: construction spawns one listener
/// task per contributor.
///
/// # Example
/// ```rust,ignore
/// let manager = RoomLifecycleManager::builder(contributors)
///     .with_config(LifecycleConfig::default())
///     .build();
///
/// let mut changes = manager.on_room_status_change(BufferingPolicy::Unbounded);
/// manager.perform_attach_operation().await?;
/// ```
pub struct RoomLifecycleManager {
    shared: Arc<Shared>,
}

impl RoomLifecycleManager {
    /// Returns a builder over a fixed list of contributors.
    ///
    /// The list order is the order in which contributors are attached and detached.
    pub fn builder(contributors: Vec<Arc<dyn Contributor>>) -> LifecycleManagerBuilder {
        LifecycleManagerBuilder::new(contributors)
    }

    /// Creates a manager with the default config and clock.
    pub fn new(contributors: Vec<Arc<dyn Contributor>>) -> Self {
        Self::builder(contributors).build()
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        shared.spawn_listeners();
        Self { shared }
    }

    /// Attaches every contributor and moves the room to attached.
    ///
    /// Waits for any operation in progress first. Fails fast if the room is
    /// releasing or released.
    ///
    /// # Panics
    /// If a contributor's failed attach leaves its channel in a state other
    /// than `SUSPENDED` or `FAILED`.
    pub async fn perform_attach_operation(&self) -> Result<(), RoomError> {
        let shared = Arc::clone(&self.shared);
        join(tokio::spawn(async move { shared.attach().await })).await
    }

    /// Detaches every contributor and moves the room to detached.
    pub async fn perform_detach_operation(&self) -> Result<(), RoomError> {
        let shared = Arc::clone(&self.shared);
        join(tokio::spawn(async move { shared.detach().await })).await
    }

    /// Detaches every non-failed contributor and moves the room to released. Never fails.
    pub async fn perform_release_operation(&self) {
        let shared = Arc::clone(&self.shared);
        let _ = join(tokio::spawn(async move { shared.release().await })).await;
    }

    /// Current public status.
    pub fn room_status(&self) -> RoomStatus {
        self.shared.state.lock().status.to_room_status()
    }

    /// Current internal status.
    pub fn status(&self) -> Status {
        self.shared.state.lock().status.clone()
    }

    /// Subscribes to public status changes.
    pub fn on_room_status_change(&self, policy: BufferingPolicy) -> Subscription<RoomStatusChange> {
        self.shared.state.lock().subscribe_room_status(policy)
    }

    /// Subscribes to every internal status transition (diagnostics).
    pub fn on_internal_status_change(&self, policy: BufferingPolicy) -> Subscription<StatusChange> {
        self.shared.state.lock().subscribe_status(policy)
    }

    /// Subscribes to discontinuities delivered to any contributor.
    pub fn on_discontinuity(&self, policy: BufferingPolicy) -> Subscription<DiscontinuityEvent> {
        self.shared.state.lock().subscribe_discontinuities(policy)
    }

    /// Resolves once presence-like operations of `feature` may run.
    ///
    /// - attached: resolves immediately;
    /// - attaching: waits for the next status change and fails unless it is attached;
    /// - anything else: fails with [`RoomError::PresenceOperationRequiresRoomAttach`].
    pub async fn wait_to_be_able_to_perform_presence_operations(
        &self,
        feature: RoomFeature,
    ) -> Result<(), RoomError> {
        let mut changes = {
            let mut state = self.shared.state.lock();
            match state.status.to_room_status() {
                RoomStatus::Attached => return Ok(()),
                RoomStatus::Attaching { .. } => {
                    state.subscribe_room_status(BufferingPolicy::Unbounded)
                }
                _ => return Err(RoomError::PresenceOperationRequiresRoomAttach { feature }),
            }
        };

        debug!(feature = %feature, "waiting for room to attach");
        match changes.next().await {
            Some(change) if change.current.is_attached() => Ok(()),
            Some(change) => Err(RoomError::RoomTransitionedToInvalidStateForPresenceOperation {
                cause: change.error().cloned().map(Box::new),
            }),
            None => Err(RoomError::RoomTransitionedToInvalidStateForPresenceOperation { cause: None }),
        }
    }
}

impl Drop for RoomLifecycleManager {
    fn drop(&mut self) {
        self.shared.token.cancel();
    }
}

/// Awaits an operation task, re-raising its panic in the caller.
async fn join(handle: JoinHandle<Result<(), RoomError>>) -> Result<(), RoomError> {
    match handle.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        // Only happens while the runtime shuts down, when the caller is torn down too.
        Err(_) => Err(RoomError::RoomIsReleased),
    }
}
