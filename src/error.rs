//! Error types used by the room lifecycle manager and its contributors.
//!
//! This module defines two types:
//!
//! - [`ChannelError`]: error information reported by a realtime channel
//!   (the transport), either as its `error_reason` or as the failure of an
//!   attach/detach call.
//! - [`RoomError`]: errors raised by room lifecycle operations, wrapping the
//!   underlying [`ChannelError`] and attributing it to a [`RoomFeature`] where
//!   applicable.
//!
//! Both types expose Ably-style `code()` / `status_code()` accessors and an
//! `as_label()` helper for logs.

use thiserror::Error;

use crate::contributor::RoomFeature;

/// # Error information reported by a realtime channel.
///
/// Mirrors the transport's error info: a numeric error code, an HTTP-like
/// status code and a human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code={code}, status={status_code})")]
pub struct ChannelError {
    /// Transport error code.
    pub code: u32,
    /// HTTP-like status code.
    pub status_code: u16,
    /// Human-readable description.
    pub message: String,
}

impl ChannelError {
    /// Creates a new channel error.
    pub fn new(code: u32, status_code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            status_code,
            message: message.into(),
        }
    }

    /// Stand-in for a channel that failed without reporting a reason.
    pub(crate) fn unspecified() -> Self {
        Self::new(0, 500, "channel failed without an error reason")
    }
}

/// # Errors produced by room lifecycle operations.
///
/// Callers of ATTACH/DETACH receive these with the cause chain intact; the
/// same values are carried by failed/suspended/attaching room statuses.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// The room is being released; the operation was rejected.
    #[error("cannot perform operation because the room is in a releasing state")]
    RoomIsReleasing,

    /// The room has been released; the operation was rejected.
    #[error("cannot perform operation because the room is in a released state")]
    RoomIsReleased,

    /// The room is failed; DETACH was rejected.
    #[error("cannot perform operation because the room is in a failed state")]
    RoomInFailedState,

    /// A contributor failed to attach.
    #[error("the {feature} feature failed to attach")]
    AttachmentFailed {
        /// Feature owning the contributor.
        feature: RoomFeature,
        /// Underlying channel error.
        #[source]
        cause: ChannelError,
    },

    /// A contributor failed to detach.
    #[error("the {feature} feature failed to detach")]
    DetachmentFailed {
        /// Feature owning the contributor.
        feature: RoomFeature,
        /// Underlying channel error.
        #[source]
        cause: ChannelError,
    },

    /// Waiting for the room to attach ended in a status other than attached.
    #[error("the room operation failed because the room was in an invalid state")]
    RoomTransitionedToInvalidStateForPresenceOperation {
        /// Error of the status the room transitioned to, if any.
        #[source]
        cause: Option<Box<RoomError>>,
    },

    /// A presence-like operation was attempted while the room is neither attaching nor attached.
    #[error("to perform this {feature} operation, you must first attach the room")]
    PresenceOperationRequiresRoomAttach {
        /// Feature that requested the operation.
        feature: RoomFeature,
    },

    /// A raw channel error (e.g. the reason attached to a contributor state change).
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl RoomError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use roomvisor::RoomError;
    ///
    /// assert_eq!(RoomError::RoomIsReleased.as_label(), "room_is_released");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RoomError::RoomIsReleasing => "room_is_releasing",
            RoomError::RoomIsReleased => "room_is_released",
            RoomError::RoomInFailedState => "room_in_failed_state",
            RoomError::AttachmentFailed { .. } => "attachment_failed",
            RoomError::DetachmentFailed { .. } => "detachment_failed",
            RoomError::RoomTransitionedToInvalidStateForPresenceOperation { .. } => {
                "room_in_invalid_state"
            }
            RoomError::PresenceOperationRequiresRoomAttach { .. } => {
                "presence_operation_requires_room_attach"
            }
            RoomError::Channel(_) => "channel_error",
        }
    }

    /// Ably-style error code.
    pub fn code(&self) -> u32 {
        match self {
            RoomError::RoomInFailedState => 102_101,
            RoomError::RoomIsReleasing => 102_102,
            RoomError::RoomIsReleased => 102_103,
            RoomError::RoomTransitionedToInvalidStateForPresenceOperation { .. } => 102_107,
            RoomError::PresenceOperationRequiresRoomAttach { .. } => 40_000,
            RoomError::AttachmentFailed { feature, .. } => match feature {
                RoomFeature::Messages => 102_001,
                RoomFeature::Presence => 102_002,
                RoomFeature::Reactions => 102_003,
                RoomFeature::Occupancy => 102_004,
                RoomFeature::Typing => 102_005,
            },
            RoomError::DetachmentFailed { feature, .. } => match feature {
                RoomFeature::Messages => 102_050,
                RoomFeature::Presence => 102_051,
                RoomFeature::Reactions => 102_052,
                RoomFeature::Occupancy => 102_053,
                RoomFeature::Typing => 102_054,
            },
            RoomError::Channel(e) => e.code,
        }
    }

    /// HTTP-like status code.
    pub fn status_code(&self) -> u16 {
        match self {
            RoomError::RoomInFailedState
            | RoomError::RoomIsReleasing
            | RoomError::RoomIsReleased
            | RoomError::PresenceOperationRequiresRoomAttach { .. } => 400,
            RoomError::AttachmentFailed { .. }
            | RoomError::DetachmentFailed { .. }
            | RoomError::RoomTransitionedToInvalidStateForPresenceOperation { .. } => 500,
            RoomError::Channel(e) => e.status_code,
        }
    }

    /// The wrapped cause, if this error wraps another one.
    pub fn cause(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self)
    }

    pub(crate) fn attachment_failed(feature: RoomFeature, cause: ChannelError) -> Self {
        RoomError::AttachmentFailed { feature, cause }
    }

    pub(crate) fn detachment_failed(feature: RoomFeature, cause: ChannelError) -> Self {
        RoomError::DetachmentFailed { feature, cause }
    }
}
