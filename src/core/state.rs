//! # Manager state: the single serialization domain.
//!
//! Everything the manager mutates lives in [`State`], behind one lock owned
//! by the manager. Every handler invocation and every operation step takes
//! the lock, mutates, and releases it before its next suspension point, so
//! no two steps ever observe each other half-done.
//!
//! ## Rules
//! - The lock is **never** held across an `.await`.
//! - `change_status` is the only way `status` changes; it publishes the
//!   internal change always and the public change only when the projection differs.
//! - Channel methods and discontinuity sinks never run while the lock is held.

use tracing::debug;

use crate::{
    contributor::DiscontinuityEvent,
    status::{OperationId, RoomStatusChange, Status, StatusChange},
    subscription::{BufferingPolicy, Subscription, SubscriptionStorage},
};

use super::{annotations::ContributorAnnotation, waiters::OperationWaiters};

/// Discontinuity to hand to the contributor at `index` once the lock is released.
pub(crate) type Delivery = (usize, DiscontinuityEvent);

/// Mutable state of one manager.
pub(crate) struct State {
    pub(crate) status: Status,
    pub(crate) annotations: Vec<ContributorAnnotation>,
    pub(crate) waiters: OperationWaiters,
    next_operation: u64,
    next_timeout: u64,
    room_status_changes: SubscriptionStorage<RoomStatusChange>,
    status_changes: SubscriptionStorage<StatusChange>,
    discontinuities: SubscriptionStorage<DiscontinuityEvent>,
}

impl State {
    pub(crate) fn new(contributors: usize) -> Self {
        Self {
            status: Status::Initialized,
            annotations: (0..contributors)
                .map(|_| ContributorAnnotation::default())
                .collect(),
            waiters: OperationWaiters::default(),
            next_operation: 0,
            next_timeout: 0,
            room_status_changes: SubscriptionStorage::new("room_status"),
            status_changes: SubscriptionStorage::new("internal_status"),
            discontinuities: SubscriptionStorage::new("discontinuity"),
        }
    }

    pub(crate) fn next_operation_id(&mut self) -> OperationId {
        self.next_operation += 1;
        OperationId(self.next_operation)
    }

    pub(crate) fn next_timeout_id(&mut self) -> u64 {
        self.next_timeout += 1;
        self.next_timeout
    }

    #[inline]
    pub(crate) fn has_operation_in_progress(&self) -> bool {
        self.status.operation_id().is_some()
    }

    /// True while `operation` still owns the status and may transition out of it.
    #[inline]
    pub(crate) fn is_driven_by(&self, operation: OperationId) -> bool {
        self.status.operation_id() == Some(operation)
    }

    /// True while a RETRY or RUNDOWN has been scheduled but has not started yet.
    #[inline]
    pub(crate) fn has_scheduled_operation(&self) -> bool {
        matches!(
            self.status,
            Status::SuspendedAwaitingRetryStart { .. } | Status::FailedAwaitingRundownStart { .. }
        )
    }

    /// Moves to `new` and notifies subscribers.
    pub(crate) fn change_status(&mut self, new: Status) {
        let previous = std::mem::replace(&mut self.status, new);
        debug!(
            from = previous.as_label(),
            to = self.status.as_label(),
            "room status changed"
        );

        let (current_public, previous_public) =
            (self.status.to_room_status(), previous.to_room_status());
        self.status_changes.emit(&StatusChange {
            current: self.status.clone(),
            previous,
        });
        if current_public != previous_public {
            self.room_status_changes.emit(&RoomStatusChange {
                current: current_public,
                previous: previous_public,
            });
        }
    }

    /// Cancels every outstanding transient-disconnect timer.
    pub(crate) fn clear_transient_timeouts(&mut self) {
        for annotation in &mut self.annotations {
            annotation.clear_transient_timeout();
        }
    }

    /// Takes every pending discontinuity, publishing each to the manager's subscribers.
    pub(crate) fn take_pending_discontinuities(&mut self) -> Vec<Delivery> {
        let pending: Vec<Delivery> = self
            .annotations
            .iter_mut()
            .enumerate()
            .filter_map(|(index, a)| a.take_pending_discontinuity().map(|ev| (index, ev)))
            .collect();
        for (_, event) in &pending {
            self.discontinuities.emit(event);
        }
        pending
    }

    /// Publishes a discontinuity for immediate delivery.
    pub(crate) fn deliver_now(&mut self, index: usize, event: DiscontinuityEvent) -> Delivery {
        self.discontinuities.emit(&event);
        (index, event)
    }

    pub(crate) fn subscribe_room_status(
        &mut self,
        policy: BufferingPolicy,
    ) -> Subscription<RoomStatusChange> {
        self.room_status_changes.create(policy)
    }

    pub(crate) fn subscribe_status(&mut self, policy: BufferingPolicy) -> Subscription<StatusChange> {
        self.status_changes.create(policy)
    }

    pub(crate) fn subscribe_discontinuities(
        &mut self,
        policy: BufferingPolicy,
    ) -> Subscription<DiscontinuityEvent> {
        self.discontinuities.create(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::RoomError, status::RoomStatus};

    #[test]
    fn public_change_only_when_projection_differs() {
        let mut state = State::new(1);
        let mut public = state.subscribe_room_status(BufferingPolicy::Unbounded);
        let mut internal = state.subscribe_status(BufferingPolicy::Unbounded);

        let attach = state.next_operation_id();
        state.change_status(Status::AttachingDueToAttach { operation: attach });
        let retry = state.next_operation_id();
        state.change_status(Status::AttachingDueToRetry { operation: retry });
        state.change_status(Status::Attached);

        assert_eq!(
            public.try_next(),
            Some(RoomStatusChange {
                current: RoomStatus::Attaching { error: None },
                previous: RoomStatus::Initialized,
            })
        );
        assert_eq!(
            public.try_next(),
            Some(RoomStatusChange {
                current: RoomStatus::Attached,
                previous: RoomStatus::Attaching { error: None },
            })
        );
        assert_eq!(public.try_next(), None);

        assert_eq!(internal.try_next().map(|c| c.current), Some(Status::AttachingDueToAttach { operation: attach }));
        assert_eq!(internal.try_next().map(|c| c.current), Some(Status::AttachingDueToRetry { operation: retry }));
        assert_eq!(internal.try_next().map(|c| c.current), Some(Status::Attached));
    }

    #[test]
    fn suspended_to_suspended_is_silent_publicly() {
        let mut state = State::new(0);
        let error = RoomError::RoomInFailedState;
        let retry = state.next_operation_id();
        state.change_status(Status::SuspendedAwaitingRetryStart {
            retry,
            error: error.clone(),
        });

        let mut public = state.subscribe_room_status(BufferingPolicy::Unbounded);
        state.change_status(Status::Suspended {
            operation: retry,
            error,
        });
        assert_eq!(public.try_next(), None);
        assert!(state.has_operation_in_progress());
        assert!(!state.has_scheduled_operation());
    }

    #[test]
    fn only_the_current_operation_drives_the_status() {
        let mut state = State::new(0);
        let attach = state.next_operation_id();
        state.change_status(Status::AttachingDueToAttach { operation: attach });
        assert!(state.is_driven_by(attach));

        let release = state.next_operation_id();
        state.change_status(Status::Releasing { operation: release });
        assert!(!state.is_driven_by(attach));
        assert!(state.is_driven_by(release));

        state.change_status(Status::Released);
        assert!(!state.is_driven_by(release));
    }

    #[test]
    fn operation_ids_are_monotonic() {
        let mut state = State::new(0);
        let a = state.next_operation_id();
        let b = state.next_operation_id();
        assert!(b > a);
        assert_ne!(state.next_timeout_id(), state.next_timeout_id());
    }
}
