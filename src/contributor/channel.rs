//! # Realtime channel surface consumed by the lifecycle manager.
//!
//! The manager does not implement the transport. It observes each channel's
//! state-change stream and calls `attach()` / `detach()`; reconnection and
//! resume logic belong to the transport.

use async_trait::async_trait;

use crate::{
    error::ChannelError,
    subscription::{BufferingPolicy, Subscription},
};

/// Connection state of a realtime channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelState {
    Initialized,
    Attaching,
    Attached,
    Detaching,
    Detached,
    Suspended,
    Failed,
}

/// Event carried by a [`ChannelStateChange`].
///
/// Mirrors [`ChannelState`] plus [`ChannelEvent::Update`], which signals a
/// resumed/non-resumed condition without a state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelEvent {
    Initialized,
    Attaching,
    Attached,
    Detaching,
    Detached,
    Suspended,
    Failed,
    Update,
}

impl From<ChannelState> for ChannelEvent {
    fn from(state: ChannelState) -> Self {
        match state {
            ChannelState::Initialized => ChannelEvent::Initialized,
            ChannelState::Attaching => ChannelEvent::Attaching,
            ChannelState::Attached => ChannelEvent::Attached,
            ChannelState::Detaching => ChannelEvent::Detaching,
            ChannelState::Detached => ChannelEvent::Detached,
            ChannelState::Suspended => ChannelEvent::Suspended,
            ChannelState::Failed => ChannelEvent::Failed,
        }
    }
}

/// One entry of a channel's state-change stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelStateChange {
    /// What happened.
    pub event: ChannelEvent,
    /// State after the change.
    pub current: ChannelState,
    /// State before the change.
    pub previous: ChannelState,
    /// Error associated with the change, if any.
    pub reason: Option<ChannelError>,
    /// Whether the channel resumed without losing continuity.
    pub resumed: bool,
}

impl ChannelStateChange {
    /// A state transition from `previous` to `current`.
    pub fn transition(
        previous: ChannelState,
        current: ChannelState,
        reason: Option<ChannelError>,
    ) -> Self {
        Self {
            event: current.into(),
            current,
            previous,
            reason,
            resumed: false,
        }
    }

    /// An `UPDATE` event while staying in `state`.
    pub fn update(state: ChannelState, resumed: bool, reason: Option<ChannelError>) -> Self {
        Self {
            event: ChannelEvent::Update,
            current: state,
            previous: state,
            reason,
            resumed,
        }
    }

    /// Marks the change as resumed.
    #[inline]
    pub fn resumed(mut self) -> Self {
        self.resumed = true;
        self
    }
}

/// # Transport channel observed and driven by the manager.
///
/// `attach()` / `detach()` are expected to leave the channel in a state
/// observable through [`state`](RealtimeChannel::state) once they return;
/// in particular a failed attach leaves it `SUSPENDED` or `FAILED`.
///
/// The manager never calls into a channel while holding its own state lock,
/// so implementations may query the manager from any of these methods.
#[async_trait]
pub trait RealtimeChannel: Send + Sync + 'static {
    /// Current state.
    fn state(&self) -> ChannelState;

    /// Error associated with the last state change.
    fn error_reason(&self) -> Option<ChannelError>;

    /// Subscribes to subsequent state changes.
    fn subscribe_to_state(&self, policy: BufferingPolicy) -> Subscription<ChannelStateChange>;

    /// Attaches the channel.
    async fn attach(&self) -> Result<(), ChannelError>;

    /// Detaches the channel.
    async fn detach(&self) -> Result<(), ChannelError>;
}
