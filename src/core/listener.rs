//! # Contributor state listeners and the reactive handler.
//!
//! One listener task per contributor consumes that contributor's state-change
//! stream and hands each change to [`Shared::on_contributor_state_change`],
//! one at a time, so per-contributor order is preserved.
//!
//! "Idle" below means no operation is in progress and no RETRY/RUNDOWN is
//! waiting to start. Channel reads (`state()`, `error_reason()`) happen
//! before the lock is taken, so a transport may call back into the manager
//! from them.
//!
//! ```text
//! channel.subscribe_to_state() ─► listener i ─► read channels ─► lock ─► react ─► unlock ─► deliver / detach
//! ```
//!
//! | event      | condition                                   | reaction                                   |
//! |------------|---------------------------------------------|--------------------------------------------|
//! | UPDATE     | not resumed, contributor attached before    | discontinuity (pending or immediate)       |
//! | ATTACHED   | always                                      | mark attached; discontinuity if re-attach  |
//! | ATTACHED   | idle                                        | clear timer; `attached` once all attached  |
//! | FAILED     | idle, room not failed yet                   | `failed`, best-effort detach of everything |
//! | SUSPENDED  | idle                                        | schedule RETRY                             |
//! | ATTACHING  | idle, no timer running                      | start transient disconnect timer           |
//! | any        | room released                               | ignored                                    |

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::{
    contributor::{ChannelEvent, ChannelState, ChannelStateChange, DiscontinuityEvent},
    error::{ChannelError, RoomError},
    status::Status,
    subscription::Subscription,
};

use super::{
    manager::Shared,
    state::{Delivery, State},
};

/// Channel readings taken before the lock.
struct Observed {
    all_attached: bool,
    reason: ChannelError,
}

/// Side effects decided under the lock, executed after it is released.
#[derive(Default)]
struct Reaction {
    deliveries: Vec<Delivery>,
    detach_all: bool,
}

impl Shared {
    /// Subscribes to every contributor's state changes and spawns one listener each.
    pub(crate) fn spawn_listeners(self: &Arc<Self>) {
        for (index, contributor) in self.contributors.iter().enumerate() {
            let changes = contributor
                .channel()
                .subscribe_to_state(self.cfg.contributor_state_buffering);
            let shared = Arc::clone(self);
            self.spawn_scoped(async move { shared.listen(index, changes).await });
        }
    }

    async fn listen(self: Arc<Self>, index: usize, mut changes: Subscription<ChannelStateChange>) {
        while let Some(change) = changes.next().await {
            self.on_contributor_state_change(index, change);
        }
        debug!(contributor = %self.contributors[index].id(), "contributor state stream ended");
    }

    /// Reacts to one state change of contributor `index`.
    pub(crate) fn on_contributor_state_change(self: &Arc<Self>, index: usize, change: ChannelStateChange) {
        let observed = Observed {
            all_attached: self.all_attached(),
            reason: self.reason_of(index, &change),
        };
        let reaction = self.react(&mut self.state.lock(), index, &change, observed);

        self.deliver(reaction.deliveries);
        if reaction.detach_all {
            self.detach_all_best_effort();
        }
    }

    fn react(
        self: &Arc<Self>,
        state: &mut State,
        index: usize,
        change: &ChannelStateChange,
        observed: Observed,
    ) -> Reaction {
        let contributor = &self.contributors[index];
        // A scheduled RETRY/RUNDOWN owns the room as much as a running operation.
        let idle = !state.has_operation_in_progress() && !state.has_scheduled_operation();
        let mut reaction = Reaction::default();
        debug!(
            contributor = %contributor.id(),
            event = ?change.event,
            resumed = change.resumed,
            status = state.status.as_label(),
            "contributor state change"
        );
        if state.status == Status::Released {
            return reaction;
        }

        match change.event {
            ChannelEvent::Update => {
                if !change.resumed && state.annotations[index].has_been_attached() {
                    reaction
                        .deliveries
                        .extend(self.discontinuity(state, index, change.reason.clone()));
                }
            }
            ChannelEvent::Attached => {
                let reattached = state.annotations[index].mark_attached();
                if reattached && !change.resumed {
                    reaction
                        .deliveries
                        .extend(self.discontinuity(state, index, change.reason.clone()));
                }

                if idle {
                    state.annotations[index].clear_transient_timeout();
                    if state.status != Status::Attached && observed.all_attached {
                        state.change_status(Status::Attached);
                    }
                }
            }
            ChannelEvent::Failed if idle && !state.status.to_room_status().is_failed() => {
                let error = RoomError::attachment_failed(contributor.feature(), observed.reason);
                state.clear_transient_timeouts();
                state.change_status(Status::Failed { error });
                reaction.detach_all = true;
            }
            ChannelEvent::Suspended if idle => {
                let error = RoomError::attachment_failed(contributor.feature(), observed.reason);
                state.clear_transient_timeouts();
                self.schedule_retry(state, index, error);
            }
            ChannelEvent::Attaching if idle && state.annotations[index].transient_timeout.is_none() => {
                self.start_transient_timeout(state, index, change.reason.clone());
            }
            _ => {}
        }
        reaction
    }

    /// Records a discontinuity as pending while an operation is in progress,
    /// otherwise returns it for immediate delivery.
    fn discontinuity(&self, state: &mut State, index: usize, error: Option<ChannelError>) -> Option<Delivery> {
        let contributor = &self.contributors[index];
        let event = DiscontinuityEvent {
            contributor: contributor.id(),
            feature: contributor.feature(),
            error,
        };

        if !state.has_operation_in_progress() {
            return Some(state.deliver_now(index, event));
        }
        if state.annotations[index].record_pending_discontinuity(event) {
            debug!(contributor = %contributor.id(), "discontinuity pending until next attach");
        } else {
            debug!(contributor = %contributor.id(), "discontinuity already pending; keeping the first");
        }
        None
    }

    fn all_attached(&self) -> bool {
        self.contributors
            .iter()
            .all(|c| c.channel().state() == ChannelState::Attached)
    }

    fn reason_of(&self, index: usize, change: &ChannelStateChange) -> ChannelError {
        change
            .reason
            .clone()
            .or_else(|| self.contributors[index].channel().error_reason())
            .unwrap_or_else(ChannelError::unspecified)
    }

    /// Detaches every contributor concurrently; failures are only logged.
    fn detach_all_best_effort(self: &Arc<Self>) {
        let shared = Arc::clone(self);
        self.spawn_scoped(async move {
            let detaches = shared.contributors.iter().map(|contributor| async move {
                if let Err(e) = contributor.channel().detach().await {
                    warn!(contributor = %contributor.id(), error = %e, "best-effort detach failed");
                }
            });
            join_all(detaches).await;
        });
    }
}
