//! # Multi-consumer event subscriptions.
//!
//! The lifecycle manager publishes room status changes, internal status
//! changes and discontinuities to any number of subscribers. Each subscriber
//! owns an independent queue whose behavior is chosen by a [`BufferingPolicy`].
//!
//! ## Architecture
//! ```text
//! emit(&T)
//!     │                       (clone per subscriber)
//!     ├──► [queue S1: unbounded]         ──► Subscription::next()
//!     ├──► [queue S2: buffering oldest]  ──► Subscription::next()
//!     └──► [queue SN: buffering newest]  ──► Subscription::next()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` never awaits a subscriber.
//! - **Per-subscriber FIFO**: each subscriber sees events in emission order.
//! - **Overflow** is handled per subscriber according to its policy.
//! - Dropped subscriptions are pruned on the next `emit()`.

mod policy;
mod storage;
mod subscription;

pub use policy::BufferingPolicy;
pub use storage::SubscriptionStorage;
pub use subscription::Subscription;
