//! # roomvisor
//!
//! **Roomvisor** coordinates the lifecycle of a chat room made of several
//! realtime channels ("contributors": messages, presence, reactions,
//! occupancy, typing) into one consistent room status.
//!
//! It attaches and detaches contributors in a fixed order, reacts to their
//! unprompted state changes (suspension, failure, transient disconnects),
//! retries and rolls back on partial failure, and tells features when they
//! may have missed messages (discontinuities).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ Contributor  │   │ Contributor  │   │ Contributor  │
//!     │  (messages)  │   │  (presence)  │   │   (typing)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ state changes    │                  │
//!            ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  listener 1  │   │  listener 2  │   │  listener 3  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └──────────────────┼──────────────────┘
//!                               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  RoomLifecycleManager                                             │
//! │  - State (status, annotations, waiters) behind one lock           │
//! │  - reactive handler (FAILED / SUSPENDED / ATTACHING / ATTACHED)   │
//! │  - operations: ATTACH, DETACH, RELEASE, RETRY, RUNDOWN            │
//! └──────┬──────────────────────────────┬─────────────────────────────┘
//!        │ attach() / detach()          │ publishes
//!        ▼                              ▼
//!   contributor channels      ┌─────────────────────────┐
//!                             │  SubscriptionStorage    │
//!                             │  (per-subscriber queue) │
//!                             └───┬─────────┬─────────┬─┘
//!                                 ▼         ▼         ▼
//!                          room status  internal   discontinuities
//! ```
//!
//! ### Status machine
//! ```text
//! initialized ─ATTACH─► attaching ──ok──► attached ─DETACH─► detaching ─► detached
//!                           │                 │
//!                           │ contributor     │ contributor SUSPENDED
//!                           │ SUSPENDED       ▼
//!                           └────────────► suspended ─RETRY─► attaching ─► attached
//!                           │ contributor FAILED
//!                           └────────────► failed (RUNDOWN detaches the rest)
//!
//! any ─RELEASE─► releasing ─► released
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                               |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------------|
//! | **Lifecycle**     | Attach / detach / release a room of contributors.            | [`RoomLifecycleManager`]                         |
//! | **Contributors**  | Transport surface the manager drives and observes.           | [`Contributor`], [`RealtimeChannel`]             |
//! | **Status**        | Public status and its fine-grained internal counterpart.     | [`RoomStatus`], [`Status`]                       |
//! | **Subscriptions** | Multi-subscriber event streams with buffering policies.      | [`Subscription`], [`BufferingPolicy`]            |
//! | **Policies**      | Pause between detach retries.                                | [`BackoffPolicy`], [`JitterPolicy`]              |
//! | **Errors**        | Typed errors with codes and cause chains.                    | [`RoomError`], [`ChannelError`]                  |
//! | **Configuration** | Grace periods, retry pauses, buffering.                      | [`LifecycleConfig`]                              |
//!
//! ## Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use roomvisor::{BufferingPolicy, Contributor, LifecycleConfig, RoomLifecycleManager};
//!
//! async fn run(contributors: Vec<Arc<dyn Contributor>>) -> Result<(), roomvisor::RoomError> {
//!     let manager = RoomLifecycleManager::builder(contributors)
//!         .with_config(LifecycleConfig::default())
//!         .build();
//!
//!     let mut changes = manager.on_room_status_change(BufferingPolicy::Unbounded);
//!     tokio::spawn(async move {
//!         while let Some(change) = changes.next().await {
//!             println!("{:?} -> {:?}", change.previous, change.current);
//!         }
//!     });
//!
//!     manager.perform_attach_operation().await?;
//!     // ...
//!     manager.perform_release_operation().await;
//!     Ok(())
//! }
//! ```

mod clock;
mod contributor;
mod core;
mod error;
mod policies;
mod status;
mod subscription;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use clock::{Clock, TokioClock};
pub use contributor::{
    ChannelEvent, ChannelState, ChannelStateChange, Contributor, ContributorId,
    DiscontinuityEvent, RealtimeChannel, RoomFeature,
};
pub use core::{LifecycleConfig, LifecycleManagerBuilder, RoomLifecycleManager};
pub use error::{ChannelError, RoomError};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use status::{OperationId, RoomStatus, RoomStatusChange, Status, StatusChange};
pub use subscription::{BufferingPolicy, Subscription, SubscriptionStorage};
