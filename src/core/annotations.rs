//! # Per-contributor bookkeeping owned by the manager.
//!
//! One [`ContributorAnnotation`] per contributor, indexed like the manager's
//! contributor list:
//! - at most one pending discontinuity, never overwritten until taken;
//! - the active transient-disconnect timeout, if any;
//! - whether the contributor has ever reached `ATTACHED` (monotonic).

use tokio_util::sync::CancellationToken;

use crate::contributor::DiscontinuityEvent;

/// Handle of a running transient-disconnect timer.
///
/// `id` is unique per manager, so a fired timer can tell whether it is still
/// the current one for its contributor.
#[derive(Debug)]
pub(crate) struct TransientDisconnectTimeout {
    pub(crate) id: u64,
    token: CancellationToken,
}

impl TransientDisconnectTimeout {
    pub(crate) fn new(id: u64, token: CancellationToken) -> Self {
        Self { id, token }
    }

    /// Cancels the timer task.
    pub(crate) fn cancel(self) {
        self.token.cancel();
    }
}

/// Mutable manager-owned state of one contributor.
#[derive(Debug, Default)]
pub(crate) struct ContributorAnnotation {
    pending_discontinuity: Option<DiscontinuityEvent>,
    pub(crate) transient_timeout: Option<TransientDisconnectTimeout>,
    has_been_attached: bool,
}

impl ContributorAnnotation {
    /// Records a discontinuity to deliver after the next attachment cycle.
    ///
    /// Returns `false` (and keeps the existing one) if one is already pending.
    pub(crate) fn record_pending_discontinuity(&mut self, event: DiscontinuityEvent) -> bool {
        if self.pending_discontinuity.is_some() {
            return false;
        }
        self.pending_discontinuity = Some(event);
        true
    }

    pub(crate) fn take_pending_discontinuity(&mut self) -> Option<DiscontinuityEvent> {
        self.pending_discontinuity.take()
    }

    #[cfg(test)]
    pub(crate) fn has_pending_discontinuity(&self) -> bool {
        self.pending_discontinuity.is_some()
    }

    /// Marks the contributor as having reached `ATTACHED`; returns the previous flag.
    pub(crate) fn mark_attached(&mut self) -> bool {
        std::mem::replace(&mut self.has_been_attached, true)
    }

    pub(crate) fn has_been_attached(&self) -> bool {
        self.has_been_attached
    }

    /// Cancels and clears the transient timeout; returns whether one was running.
    pub(crate) fn clear_transient_timeout(&mut self) -> bool {
        match self.transient_timeout.take() {
            Some(timeout) => {
                timeout.cancel();
                true
            }
            None => false,
        }
    }
}
