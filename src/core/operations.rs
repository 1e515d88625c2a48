//! # Lifecycle operations.
//!
//! Bodies of ATTACH / DETACH / RELEASE (user-triggered) and RETRY / RUNDOWN
//! (scheduled by the manager), plus the attachment and detachment cycles they
//! share.
//!
//! ```text
//! ATTACH ──► attachment cycle ──ok──► attached (+ flush pending discontinuities)
//!                  │
//!                  ├─ contributor SUSPENDED ─► suspendedAwaitingRetryStart ─► RETRY
//!                  └─ contributor FAILED ────► failedAwaitingRundownStart ──► RUNDOWN
//!
//! RETRY ──► suspended ─► detachment cycle (all but trigger) ─► wait trigger ATTACHED
//!                                                              └─► attachingDueToRetry ─► attachment cycle
//! RUNDOWN ─► failedAndRundown ─► detach every non-failed contributor ─► failed
//! ```
//!
//! ## Rules
//! - Every operation gets a fresh [`OperationId`]; while the status carries
//!   it, the operation is "in progress".
//! - The state lock is taken per step and released before every `.await`;
//!   each step re-reads the status instead of assuming it is unchanged.
//! - When an operation body returns, every waiter registered for its ID is
//!   resumed with its result.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, info, warn};

use crate::{
    contributor::{ChannelState, Contributor},
    error::{ChannelError, RoomError},
    status::{OperationId, Status},
    subscription::BufferingPolicy,
};

use super::{
    annotations::TransientDisconnectTimeout,
    manager::Shared,
    state::State,
    waiters::OperationResult,
};

/// Which contributors a detachment cycle targets and where it leaves the room.
#[derive(Clone, Copy, Debug)]
pub(crate) enum DetachCycle {
    /// Every contributor; ends in `detached`.
    Detach { operation: OperationId },
    /// Every contributor but `trigger`; ends in `detachedDueToRetry(operation)`.
    Retry {
        operation: OperationId,
        trigger: usize,
    },
}

impl DetachCycle {
    fn operation(&self) -> OperationId {
        match self {
            DetachCycle::Detach { operation } | DetachCycle::Retry { operation, .. } => *operation,
        }
    }

    fn skips(&self, index: usize) -> bool {
        matches!(self, DetachCycle::Retry { trigger, .. } if *trigger == index)
    }

    fn detached_status(&self) -> Status {
        match self {
            DetachCycle::Detach { .. } => Status::Detached,
            DetachCycle::Retry { operation, .. } => Status::DetachedDueToRetry {
                operation: *operation,
            },
        }
    }
}

/// How the contributor that triggered a RETRY settled.
enum TriggerOutcome {
    Attached,
    Failed(ChannelError),
    /// Its state stream ended before it settled.
    Closed,
}

impl Shared {
    /// Runs `body` as operation `operation` and resumes its waiters.
    async fn run_operation<F>(
        &self,
        kind: &'static str,
        operation: OperationId,
        body: F,
    ) -> OperationResult
    where
        F: Future<Output = OperationResult>,
    {
        debug!(operation = %operation, kind, "operation started");
        let result = body.await;
        match &result {
            Ok(()) => debug!(operation = %operation, kind, "operation completed"),
            Err(e) => debug!(operation = %operation, kind, error = %e, "operation failed"),
        }

        let resumed = self.state.lock().waiters.complete(operation, &result);
        if resumed > 0 {
            debug!(operation = %operation, resumed, "resumed waiting operations");
        }
        result
    }

    /// ATTACH: waits for any operation in progress, then runs the attachment cycle.
    pub(crate) async fn attach(self: &Arc<Self>) -> OperationResult {
        loop {
            let next = {
                let mut state = self.state.lock();
                match &state.status {
                    Status::Attached => return Ok(()),
                    Status::Releasing { .. } => return Err(RoomError::RoomIsReleasing),
                    Status::Released => return Err(RoomError::RoomIsReleased),
                    _ => {}
                }

                match state.status.operation_id() {
                    Some(current) => Err(state.waiters.register(current)),
                    None => {
                        let operation = state.next_operation_id();
                        state.clear_transient_timeouts();
                        state.change_status(Status::AttachingDueToAttach { operation });
                        Ok(operation)
                    }
                }
            };

            let waiter = match next {
                Ok(operation) => {
                    return self
                        .run_operation("attach", operation, self.attachment_cycle(operation))
                        .await;
                }
                Err(waiter) => waiter,
            };

            debug!(waiting_for = %waiter.operation(), "attach waiting for operation in progress");
            // The awaited outcome does not matter; fast paths are re-checked.
            let _ = waiter.wait().await;
        }
    }

    /// DETACH: detaches every contributor.
    pub(crate) async fn detach(self: &Arc<Self>) -> OperationResult {
        let operation = {
            let mut state = self.state.lock();
            match &state.status {
                Status::Detached | Status::DetachedDueToRetry { .. } => return Ok(()),
                Status::Releasing { .. } => return Err(RoomError::RoomIsReleasing),
                Status::Released => return Err(RoomError::RoomIsReleased),
                status if status.to_room_status().is_failed() => {
                    return Err(RoomError::RoomInFailedState);
                }
                _ => {}
            }

            let operation = state.next_operation_id();
            state.clear_transient_timeouts();
            state.change_status(Status::Detaching { operation });
            operation
        };

        self.run_operation(
            "detach",
            operation,
            self.detachment_cycle(DetachCycle::Detach { operation }),
        )
        .await
    }

    /// RELEASE: detaches every non-failed contributor and ends in `released`.
    pub(crate) async fn release(self: &Arc<Self>) -> OperationResult {
        let operation = {
            let mut state = self.state.lock();
            match &state.status {
                Status::Released => return Ok(()),
                Status::Detached | Status::DetachedDueToRetry { .. } | Status::Initialized => {
                    state.clear_transient_timeouts();
                    state.change_status(Status::Released);
                    return Ok(());
                }
                _ => {}
            }

            match state.status.operation_id() {
                Some(current) if matches!(state.status, Status::Releasing { .. }) => {
                    Err(state.waiters.register(current))
                }
                _ => {
                    let operation = state.next_operation_id();
                    state.clear_transient_timeouts();
                    state.change_status(Status::Releasing { operation });
                    Ok(operation)
                }
            }
        };

        let operation = match operation {
            Ok(operation) => operation,
            Err(waiter) => {
                debug!(waiting_for = %waiter.operation(), "release already in progress");
                return waiter.wait().await;
            }
        };

        self.run_operation("release", operation, async {
            for contributor in &self.contributors {
                self.detach_until_settled(contributor.as_ref()).await;
            }
            self.state.lock().change_status(Status::Released);
            Ok(())
        })
        .await
    }

    /// Attaches every contributor in order on behalf of `operation`.
    ///
    /// On the first failure a RETRY or RUNDOWN is scheduled depending on the
    /// state the contributor was left in, and the attributed error is returned.
    /// Once another operation has taken over the status, the cycle stops
    /// without touching it.
    async fn attachment_cycle(self: &Arc<Self>, operation: OperationId) -> OperationResult {
        for (index, contributor) in self.contributors.iter().enumerate() {
            if self.superseded(operation, "attachment cycle") {
                return Ok(());
            }
            let channel = contributor.channel();
            let Err(err) = channel.attach().await else {
                continue;
            };

            let left_in = channel.state();
            let reason = channel.error_reason().unwrap_or(err);
            let error = RoomError::attachment_failed(contributor.feature(), reason);
            debug!(
                contributor = %contributor.id(),
                state = ?left_in,
                error = %error,
                "contributor failed to attach"
            );

            let mut state = self.state.lock();
            if !state.is_driven_by(operation) {
                debug!(operation = %operation, status = state.status.as_label(), "attachment cycle superseded");
                return Err(error);
            }
            match left_in {
                ChannelState::Suspended => self.schedule_retry(&mut state, index, error.clone()),
                ChannelState::Failed => self.schedule_rundown(&mut state, error.clone()),
                other => panic!(
                    "contributor {} is {other:?} after a failed attach; expected Suspended or Failed",
                    contributor.id()
                ),
            }
            return Err(error);
        }

        let deliveries = {
            let mut state = self.state.lock();
            if !state.is_driven_by(operation) {
                debug!(operation = %operation, status = state.status.as_label(), "attachment cycle superseded");
                return Ok(());
            }
            state.clear_transient_timeouts();
            state.change_status(Status::Attached);
            state.take_pending_discontinuities()
        };
        self.deliver(deliveries);
        Ok(())
    }

    /// Detaches the contributors targeted by `cycle`.
    ///
    /// A contributor that ends up FAILED is skipped (the first such error is
    /// returned once every contributor has been tried); any other failure is
    /// retried after a pause until it succeeds. Once another operation has
    /// taken over the status, the cycle stops without touching it.
    async fn detachment_cycle(&self, cycle: DetachCycle) -> OperationResult {
        let operation = cycle.operation();
        let mut first_error: Option<RoomError> = None;
        // Set once this cycle has failed the room; it still tries the remaining contributors.
        let mut failed_room = false;

        for (index, contributor) in self.contributors.iter().enumerate() {
            if cycle.skips(index) {
                continue;
            }
            if !failed_room && self.superseded(operation, "detachment cycle") {
                return first_error.map_or(Ok(()), Err);
            }
            let channel = contributor.channel();
            let mut attempt = 0u32;

            while let Err(err) = channel.detach().await {
                if channel.state() == ChannelState::Failed {
                    let error = RoomError::detachment_failed(contributor.feature(), err);
                    warn!(contributor = %contributor.id(), error = %error, "contributor failed during detach");
                    {
                        let mut state = self.state.lock();
                        if state.is_driven_by(operation) {
                            state.change_status(Status::Failed {
                                error: error.clone(),
                            });
                            failed_room = true;
                        }
                    }
                    first_error.get_or_insert(error);
                    break;
                }

                let pause = self.cfg.detach_retry.next(attempt);
                debug!(
                    contributor = %contributor.id(),
                    error = %err,
                    attempt,
                    pause_ms = pause.as_millis() as u64,
                    "detach failed; retrying"
                );
                self.clock.sleep(pause).await;
                attempt = attempt.saturating_add(1);
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }
        let mut state = self.state.lock();
        if state.is_driven_by(operation) {
            state.change_status(cycle.detached_status());
        } else {
            debug!(operation = %operation, status = state.status.as_label(), "detachment cycle superseded");
        }
        Ok(())
    }

    /// Logs and returns true once `operation` no longer owns the status.
    fn superseded(&self, operation: OperationId, what: &'static str) -> bool {
        let state = self.state.lock();
        if state.is_driven_by(operation) {
            return false;
        }
        debug!(operation = %operation, status = state.status.as_label(), "{what} superseded");
        true
    }

    /// Detaches `contributor` until it succeeds, unless the channel is (or becomes) FAILED.
    async fn detach_until_settled(&self, contributor: &dyn Contributor) {
        let channel = contributor.channel();
        let mut attempt = 0u32;

        while channel.state() != ChannelState::Failed {
            match channel.detach().await {
                Ok(()) => return,
                Err(err) => {
                    let pause = self.cfg.detach_retry.next(attempt);
                    warn!(contributor = %contributor.id(), error = %err, attempt, "detach failed; retrying");
                    self.clock.sleep(pause).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
        debug!(contributor = %contributor.id(), "skipping detach of failed contributor");
    }

    /// Moves to `suspendedAwaitingRetryStart` and spawns a RETRY triggered by contributor `trigger`.
    pub(crate) fn schedule_retry(self: &Arc<Self>, state: &mut State, trigger: usize, error: RoomError) {
        let retry = state.next_operation_id();
        info!(
            operation = %retry,
            contributor = %self.contributors[trigger].id(),
            error = %error,
            "scheduling retry"
        );
        state.change_status(Status::SuspendedAwaitingRetryStart {
            retry,
            error: error.clone(),
        });

        let shared = Arc::clone(self);
        self.spawn_scoped(async move {
            let body = Arc::clone(&shared).retry(retry, trigger, error);
            let _ = shared.run_operation("retry", retry, body).await;
        });
    }

    /// Moves to `failedAwaitingRundownStart` and spawns a RUNDOWN.
    pub(crate) fn schedule_rundown(self: &Arc<Self>, state: &mut State, error: RoomError) {
        let rundown = state.next_operation_id();
        info!(operation = %rundown, error = %error, "scheduling rundown");
        state.change_status(Status::FailedAwaitingRundownStart {
            rundown,
            error: error.clone(),
        });

        let shared = Arc::clone(self);
        self.spawn_scoped(async move {
            let body = Arc::clone(&shared).rundown(rundown, error);
            let _ = shared.run_operation("rundown", rundown, body).await;
        });
    }

    fn retry(
        self: Arc<Self>,
        operation: OperationId,
        trigger: usize,
        error: RoomError,
    ) -> BoxFuture<'static, OperationResult> {
        async move {
            {
                let mut state = self.state.lock();
                if !matches!(&state.status, Status::SuspendedAwaitingRetryStart { retry, .. } if *retry == operation)
                {
                    debug!(operation = %operation, status = state.status.as_label(), "retry superseded");
                    return Ok(());
                }
                state.clear_transient_timeouts();
                state.change_status(Status::Suspended { operation, error });
            }

            self.detachment_cycle(DetachCycle::Retry { operation, trigger })
                .await?;

            let contributor = &self.contributors[trigger];
            match self.wait_for_trigger(contributor.as_ref()).await {
                TriggerOutcome::Attached => {}
                TriggerOutcome::Failed(reason) => {
                    let error = RoomError::attachment_failed(contributor.feature(), reason);
                    let mut state = self.state.lock();
                    if state.status.operation_id() == Some(operation) {
                        state.change_status(Status::Failed {
                            error: error.clone(),
                        });
                    }
                    return Err(error);
                }
                TriggerOutcome::Closed => {
                    debug!(operation = %operation, contributor = %contributor.id(), "state stream ended during retry");
                    return Ok(());
                }
            }

            {
                let mut state = self.state.lock();
                if state.status.operation_id() != Some(operation) {
                    debug!(operation = %operation, status = state.status.as_label(), "retry superseded");
                    return Ok(());
                }
                state.change_status(Status::AttachingDueToRetry { operation });
            }
            self.attachment_cycle(operation).await
        }
        .boxed()
    }

    fn rundown(self: Arc<Self>, operation: OperationId, error: RoomError) -> BoxFuture<'static, OperationResult> {
        async move {
            {
                let mut state = self.state.lock();
                if !matches!(&state.status, Status::FailedAwaitingRundownStart { rundown, .. } if *rundown == operation)
                {
                    debug!(operation = %operation, status = state.status.as_label(), "rundown superseded");
                    return Ok(());
                }
                state.clear_transient_timeouts();
                state.change_status(Status::FailedAndRundown {
                    operation,
                    error: error.clone(),
                });
            }

            for contributor in &self.contributors {
                self.detach_until_settled(contributor.as_ref()).await;
            }

            let mut state = self.state.lock();
            if state.status.operation_id() == Some(operation) {
                state.change_status(Status::Failed { error });
            }
            Ok(())
        }
        .boxed()
    }

    /// Waits for `contributor` to reach ATTACHED or FAILED on its own.
    async fn wait_for_trigger(&self, contributor: &dyn Contributor) -> TriggerOutcome {
        let channel = contributor.channel();
        let mut changes = channel.subscribe_to_state(BufferingPolicy::Unbounded);

        match channel.state() {
            ChannelState::Attached => return TriggerOutcome::Attached,
            ChannelState::Failed => {
                let reason = channel.error_reason().unwrap_or_else(ChannelError::unspecified);
                return TriggerOutcome::Failed(reason);
            }
            _ => {}
        }

        while let Some(change) = changes.next().await {
            match change.current {
                ChannelState::Attached => return TriggerOutcome::Attached,
                ChannelState::Failed => {
                    let reason = change
                        .reason
                        .or_else(|| channel.error_reason())
                        .unwrap_or_else(ChannelError::unspecified);
                    return TriggerOutcome::Failed(reason);
                }
                _ => {}
            }
        }
        TriggerOutcome::Closed
    }

    /// Starts the grace-period timer of contributor `index`.
    pub(crate) fn start_transient_timeout(
        self: &Arc<Self>,
        state: &mut State,
        index: usize,
        reason: Option<ChannelError>,
    ) {
        let id = state.next_timeout_id();
        let token = self.token.child_token();
        state.annotations[index].transient_timeout =
            Some(TransientDisconnectTimeout::new(id, token.clone()));
        debug!(contributor = %self.contributors[index].id(), timeout = id, "transient disconnect timer started");

        let shared = Arc::clone(self);
        let grace = self.cfg.transient_disconnect_timeout;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = shared.clock.sleep(grace) => shared.transient_timeout_elapsed(index, id, reason),
            }
        });
    }

    fn transient_timeout_elapsed(&self, index: usize, id: u64, reason: Option<ChannelError>) {
        let mut state = self.state.lock();
        let annotation = &mut state.annotations[index];
        if annotation.transient_timeout.as_ref().map(|t| t.id) != Some(id) {
            return;
        }
        annotation.transient_timeout = None;

        debug!(contributor = %self.contributors[index].id(), timeout = id, "transient disconnect timer elapsed");
        state.change_status(Status::AttachingDueToContributorChange {
            error: reason.map(RoomError::Channel),
        });
    }
}
