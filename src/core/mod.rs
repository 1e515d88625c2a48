//! Lifecycle core: state machine, operations and contributor listeners.
//!
//! The only public API from this module is [`RoomLifecycleManager`] (plus
//! its builder and config).
//!
//! Internal modules:
//! - [`manager`]: shared state, the public manager and its teardown;
//! - [`operations`]: ATTACH / DETACH / RELEASE / RETRY / RUNDOWN and the cycles;
//! - [`listener`]: per-contributor listeners and the reactive handler;
//! - [`state`]: the single serialization domain (status, annotations, fan-out);
//! - [`annotations`]: per-contributor bookkeeping;
//! - [`waiters`]: operation-result coordinator.

mod annotations;
mod builder;
mod config;
mod listener;
mod manager;
mod operations;
mod state;
mod waiters;


pub use builder::LifecycleManagerBuilder;
pub use config::LifecycleConfig;
pub use manager::RoomLifecycleManager;
