//! Retry pause policies.
//!
//! DETACH, RELEASE, RUNDOWN and RETRY retry a contributor's detach
//! indefinitely until it succeeds. This module controls **how long** the
//! manager pauses between two attempts.
//!
//! ## Contents
//! - [`BackoffPolicy`] how pauses evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to spread retries of many rooms
//!
//! ## Quick wiring
//! ```text
//! LifecycleConfig { detach_retry: BackoffPolicy, .. }
//!      └─► core::operations detach-until-success loop uses:
//!           - detach_retry.next(attempt) to pause before the next attempt
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=250ms, factor=1.0 (constant), max=250ms, jitter=None.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
