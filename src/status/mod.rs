//! Room status: the manager's fine-grained [`Status`] and its public projection.
//!
//! ## Contents
//! - [`Status`], [`StatusChange`] internal state machine, with operation IDs
//! - [`RoomStatus`], [`RoomStatusChange`] externally documented statuses
//! - [`OperationId`] identity of a lifecycle operation
//!
//! ## Projection
//! ```text
//! initialized                         ─► initialized
//! attachingDueToAttach(op)          ┐
//! attachingDueToRetry(op)           ├► attaching(error?)
//! attachingDueToContributorChange(e)┘
//! attached                            ─► attached
//! detaching(op)                       ─► detaching
//! detached, detachedDueToRetry(op)    ─► detached
//! suspendedAwaitingRetryStart, suspended ─► suspended(error)
//! failedAwaitingRundownStart, failedAndRundown, failed ─► failed(error)
//! releasing(op)                       ─► releasing
//! released                            ─► released
//! ```

mod internal;
mod room_status;

pub use internal::{OperationId, Status, StatusChange};
pub use room_status::{RoomStatus, RoomStatusChange};
