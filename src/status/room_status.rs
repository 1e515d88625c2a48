//! # Public room status.

use crate::error::RoomError;

/// Externally documented room status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoomStatus {
    Initialized,
    Attaching { error: Option<RoomError> },
    Attached,
    Detaching,
    Detached,
    Suspended { error: RoomError },
    Failed { error: RoomError },
    Releasing,
    Released,
}

impl RoomStatus {
    /// Error associated with the status, if any.
    pub fn error(&self) -> Option<&RoomError> {
        match self {
            RoomStatus::Attaching { error } => error.as_ref(),
            RoomStatus::Suspended { error } | RoomStatus::Failed { error } => Some(error),
            _ => None,
        }
    }

    #[inline]
    pub fn is_attaching(&self) -> bool {
        matches!(self, RoomStatus::Attaching { .. })
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        matches!(self, RoomStatus::Attached)
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        matches!(self, RoomStatus::Suspended { .. })
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, RoomStatus::Failed { .. })
    }
}

/// Change of the public room status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomStatusChange {
    pub current: RoomStatus,
    pub previous: RoomStatus,
}

impl RoomStatusChange {
    /// Error of the new status, if any.
    pub fn error(&self) -> Option<&RoomError> {
        self.current.error()
    }
}
