//! # Discontinuity events.
//!
//! A discontinuity tells a feature that messages or state may have been
//! missed on its channel and that it should resynchronize (e.g. re-fetch
//! history).

use crate::error::ChannelError;

use super::{ContributorId, RoomFeature};

/// Signal that a contributor may have lost continuity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscontinuityEvent {
    /// Contributor that lost continuity.
    pub contributor: ContributorId,
    /// Feature owning the contributor.
    pub feature: RoomFeature,
    /// Reason reported by the channel, if any.
    pub error: Option<ChannelError>,
}
