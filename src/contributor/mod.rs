//! # Contributors: the realtime channels feeding a room's status.
//!
//! A room is made of several features (messages, presence, reactions,
//! occupancy, typing). Each one is backed by a [`Contributor`]: a realtime
//! channel with a stable identity, a feature tag used for error attribution
//! and a sink for discontinuity events.
//!
//! ## Contents
//! - [`RealtimeChannel`], [`ChannelState`], [`ChannelEvent`], [`ChannelStateChange`]
//!   the transport surface the manager consumes
//! - [`Contributor`], [`ContributorId`], [`RoomFeature`] lifecycle participants
//! - [`DiscontinuityEvent`] signal that a contributor may have missed messages

mod channel;
mod contributor;
mod discontinuity;

pub use channel::{ChannelEvent, ChannelState, ChannelStateChange, RealtimeChannel};
pub use contributor::{Contributor, ContributorId, RoomFeature};
pub use discontinuity::DiscontinuityEvent;
