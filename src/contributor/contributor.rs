//! # Lifecycle participants.

use std::{fmt, sync::Arc};

use super::{DiscontinuityEvent, RealtimeChannel};

/// Room feature a contributor belongs to (used to attribute errors).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoomFeature {
    Messages,
    Presence,
    Reactions,
    Occupancy,
    Typing,
}

impl RoomFeature {
    /// Lowercase feature name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomFeature::Messages => "messages",
            RoomFeature::Presence => "presence",
            RoomFeature::Reactions => "reactions",
            RoomFeature::Occupancy => "occupancy",
            RoomFeature::Typing => "typing",
        }
    }
}

impl fmt::Display for RoomFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable, comparable contributor identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContributorId(Arc<str>);

impl ContributorId {
    /// Creates an identity from any string-like value.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContributorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContributorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// # One channel participating in a room's lifecycle.
///
/// Contributors are handed to the manager once at construction and never
/// added or removed afterwards. Exactly one manager observes a given set.
pub trait Contributor: Send + Sync + 'static {
    /// Stable identity.
    fn id(&self) -> ContributorId;

    /// Feature this contributor serves.
    fn feature(&self) -> RoomFeature;

    /// Underlying realtime channel.
    fn channel(&self) -> &dyn RealtimeChannel;

    /// Delivers a discontinuity to the feature that owns this contributor.
    fn emit_discontinuity(&self, event: DiscontinuityEvent);
}
