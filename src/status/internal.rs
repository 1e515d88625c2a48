//! # Internal lifecycle status.
//!
//! Several cases carry the [`OperationId`] of the operation that put the room
//! there; only that operation is expected to move the room out again. An
//! operation is "in progress" exactly when [`Status::operation_id`] is `Some`.

use std::fmt;

use crate::error::RoomError;

use super::RoomStatus;

/// Identity of one lifecycle operation (monotonic per manager).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub(crate) u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Manager-internal room status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Initialized,
    AttachingDueToAttach {
        operation: OperationId,
    },
    AttachingDueToRetry {
        operation: OperationId,
    },
    AttachingDueToContributorChange {
        error: Option<RoomError>,
    },
    Attached,
    Detaching {
        operation: OperationId,
    },
    Detached,
    DetachedDueToRetry {
        operation: OperationId,
    },
    /// A RETRY has been scheduled but has not started yet; `retry` identifies it.
    SuspendedAwaitingRetryStart {
        retry: OperationId,
        error: RoomError,
    },
    Suspended {
        operation: OperationId,
        error: RoomError,
    },
    /// A RUNDOWN has been scheduled but has not started yet; `rundown` identifies it.
    FailedAwaitingRundownStart {
        rundown: OperationId,
        error: RoomError,
    },
    FailedAndRundown {
        operation: OperationId,
        error: RoomError,
    },
    Failed {
        error: RoomError,
    },
    Releasing {
        operation: OperationId,
    },
    Released,
}

impl Status {
    /// ID of the operation currently driving status transitions, if any.
    pub fn operation_id(&self) -> Option<OperationId> {
        match self {
            Status::AttachingDueToAttach { operation }
            | Status::AttachingDueToRetry { operation }
            | Status::Detaching { operation }
            | Status::DetachedDueToRetry { operation }
            | Status::Suspended { operation, .. }
            | Status::FailedAndRundown { operation, .. }
            | Status::Releasing { operation } => Some(*operation),
            Status::Initialized
            | Status::AttachingDueToContributorChange { .. }
            | Status::Attached
            | Status::Detached
            | Status::SuspendedAwaitingRetryStart { .. }
            | Status::FailedAwaitingRundownStart { .. }
            | Status::Failed { .. }
            | Status::Released => None,
        }
    }

    /// Projects onto the public [`RoomStatus`].
    pub fn to_room_status(&self) -> RoomStatus {
        match self {
            Status::Initialized => RoomStatus::Initialized,
            Status::AttachingDueToAttach { .. } | Status::AttachingDueToRetry { .. } => {
                RoomStatus::Attaching { error: None }
            }
            Status::AttachingDueToContributorChange { error } => RoomStatus::Attaching {
                error: error.clone(),
            },
            Status::Attached => RoomStatus::Attached,
            Status::Detaching { .. } => RoomStatus::Detaching,
            Status::Detached | Status::DetachedDueToRetry { .. } => RoomStatus::Detached,
            Status::SuspendedAwaitingRetryStart { error, .. } | Status::Suspended { error, .. } => {
                RoomStatus::Suspended {
                    error: error.clone(),
                }
            }
            Status::FailedAwaitingRundownStart { error, .. }
            | Status::FailedAndRundown { error, .. }
            | Status::Failed { error } => RoomStatus::Failed {
                error: error.clone(),
            },
            Status::Releasing { .. } => RoomStatus::Releasing,
            Status::Released => RoomStatus::Released,
        }
    }

    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Status::Initialized => "initialized",
            Status::AttachingDueToAttach { .. } => "attaching_due_to_attach",
            Status::AttachingDueToRetry { .. } => "attaching_due_to_retry",
            Status::AttachingDueToContributorChange { .. } => "attaching_due_to_contributor_change",
            Status::Attached => "attached",
            Status::Detaching { .. } => "detaching",
            Status::Detached => "detached",
            Status::DetachedDueToRetry { .. } => "detached_due_to_retry",
            Status::SuspendedAwaitingRetryStart { .. } => "suspended_awaiting_retry_start",
            Status::Suspended { .. } => "suspended",
            Status::FailedAwaitingRundownStart { .. } => "failed_awaiting_rundown_start",
            Status::FailedAndRundown { .. } => "failed_and_rundown",
            Status::Failed { .. } => "failed",
            Status::Releasing { .. } => "releasing",
            Status::Released => "released",
        }
    }
}

/// Transition between two internal statuses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub current: Status,
    pub previous: Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err() -> RoomError {
        RoomError::RoomInFailedState
    }

    #[test]
    fn attaching_causes_collapse_to_one_public_status() {
        let op = OperationId(1);
        assert_eq!(
            Status::AttachingDueToAttach { operation: op }.to_room_status(),
            Status::AttachingDueToRetry { operation: op }.to_room_status(),
        );
        assert_eq!(
            Status::AttachingDueToContributorChange { error: None }.to_room_status(),
            RoomStatus::Attaching { error: None },
        );
    }

    #[test]
    fn operation_in_progress_only_for_operation_statuses() {
        let op = OperationId(7);
        let in_progress = [
            Status::AttachingDueToAttach { operation: op },
            Status::AttachingDueToRetry { operation: op },
            Status::Detaching { operation: op },
            Status::DetachedDueToRetry { operation: op },
            Status::Suspended { operation: op, error: err() },
            Status::FailedAndRundown { operation: op, error: err() },
            Status::Releasing { operation: op },
        ];
        for status in in_progress {
            assert_eq!(status.operation_id(), Some(op), "{}", status.as_label());
        }

        let idle = [
            Status::Initialized,
            Status::Attached,
            Status::Detached,
            Status::Released,
            Status::Failed { error: err() },
            Status::SuspendedAwaitingRetryStart { retry: op, error: err() },
            Status::FailedAwaitingRundownStart { rundown: op, error: err() },
            Status::AttachingDueToContributorChange { error: None },
        ];
        for status in idle {
            assert_eq!(status.operation_id(), None, "{}", status.as_label());
        }
    }

    #[test]
    fn suspended_and_failed_cases_keep_their_error() {
        let op = OperationId(3);
        assert_eq!(
            Status::SuspendedAwaitingRetryStart { retry: op, error: err() }.to_room_status(),
            RoomStatus::Suspended { error: err() },
        );
        assert_eq!(
            Status::FailedAndRundown { operation: op, error: err() }.to_room_status(),
            RoomStatus::Failed { error: err() },
        );
        assert_eq!(
            Status::DetachedDueToRetry { operation: op }.to_room_status(),
            RoomStatus::Detached,
        );
    }
}
