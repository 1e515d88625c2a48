//! # Buffering policy for a single subscription.
//!
//! - [`BufferingPolicy::Unbounded`]: every event is kept until consumed.
//! - [`BufferingPolicy::BufferingOldest`]: keeps the first `n` unconsumed events,
//!   newer events are dropped while the queue is full.
//! - [`BufferingPolicy::BufferingNewest`]: keeps the latest `n` unconsumed events,
//!   the oldest are overwritten.

/// How a subscription buffers events that have not been consumed yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BufferingPolicy {
    /// Unlimited queue (default).
    #[default]
    Unbounded,
    /// Bounded queue; on overflow the **new** event is dropped.
    BufferingOldest(usize),
    /// Bounded ring; on overflow the **oldest** event is dropped.
    ///
    /// The ring size is rounded up to the next power of two.
    BufferingNewest(usize),
}

impl BufferingPolicy {
    /// Returns the queue capacity, clamped to a minimum of 1 (`None` = unbounded).
    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        match self {
            BufferingPolicy::Unbounded => None,
            BufferingPolicy::BufferingOldest(n) | BufferingPolicy::BufferingNewest(n) => {
                Some((*n).max(1))
            }
        }
    }
}
