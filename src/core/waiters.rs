//! # Operation-result coordinator.
//!
//! Lets one lifecycle operation wait for another in-flight operation to
//! complete, by operation ID.
//!
//! ```text
//! ATTACH(op-2)                      DETACH(op-1)
//!   lock ─► register(op-1) ─► unlock
//!   wait ...                          ...
//!                                     lock ─► complete(op-1, result) ─► unlock
//!   ◄──────────── result ─────────────┘
//! ```
//!
//! ## Rules
//! - Registration and completion both happen under the manager's state lock,
//!   so a waiter registered while `op` is still in progress is always resumed.
//! - `complete` resumes every waiter for the ID exactly once, then forgets the ID.
//! - A waiter whose operation was abandoned (e.g. manager torn down) resolves to `Ok(())`.

use std::collections::HashMap;

use tokio::sync::oneshot;

use crate::{error::RoomError, status::OperationId};

/// Outcome of a lifecycle operation.
pub(crate) type OperationResult = Result<(), RoomError>;

/// Pending waiters keyed by the operation they wait for.
#[derive(Default)]
pub(crate) struct OperationWaiters {
    waiting: HashMap<OperationId, Vec<oneshot::Sender<OperationResult>>>,
}

impl OperationWaiters {
    /// Registers interest in the completion of `operation`.
    pub(crate) fn register(&mut self, operation: OperationId) -> Waiter {
        let (tx, rx) = oneshot::channel();
        self.waiting.entry(operation).or_default().push(tx);
        Waiter { operation, rx }
    }

    /// Resumes every waiter of `operation` with `result`; returns how many were resumed.
    pub(crate) fn complete(&mut self, operation: OperationId, result: &OperationResult) -> usize {
        let Some(senders) = self.waiting.remove(&operation) else {
            return 0;
        };
        senders
            .into_iter()
            .filter_map(|tx| tx.send(result.clone()).ok())
            .count()
    }

    /// Number of operations that currently have waiters.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.waiting.len()
    }
}

/// Handle returned by [`OperationWaiters::register`].
pub(crate) struct Waiter {
    operation: OperationId,
    rx: oneshot::Receiver<OperationResult>,
}

impl Waiter {
    /// Operation being waited for.
    pub(crate) fn operation(&self) -> OperationId {
        self.operation
    }

    /// Suspends until the operation completes.
    pub(crate) async fn wait(self) -> OperationResult {
        self.rx.await.unwrap_or(Ok(()))
    }
}
