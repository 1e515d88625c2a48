//! # SubscriptionStorage: non-blocking fan-out over multiple subscriptions
//!
//! [`SubscriptionStorage`] distributes each event to every live
//! [`Subscription`] **without awaiting** its consumer.
//!
//! ## What it guarantees
//! - `emit(&T)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - A slow subscriber only loses its own events, as its policy dictates.
//!
//! ## What it does **not** guarantee
//! - No delivery to subscriptions created after the event was emitted.
//! - No retries on per-subscriber queue overflow.
//!
//! ## Diagram
//! ```text
//!    emit(&T)
//!        │                        (clone per subscriber)
//!        ├────────────────► [mpsc unbounded]     ─► Subscription::next()
//!        ├────────────────► [mpsc bounded]       ─► Subscription::next()   (try_send, drop new)
//!        └────────────────► [broadcast ring]     ─► Subscription::next()   (overwrite oldest)
//! ```

use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use super::{BufferingPolicy, Subscription, subscription::Receiver};

/// Producer side of one subscription.
enum Sender<T> {
    Unbounded(mpsc::UnboundedSender<T>),
    Oldest(mpsc::Sender<T>),
    Newest(broadcast::Sender<T>),
}

/// Composite fan-out with one queue per subscription.
pub struct SubscriptionStorage<T> {
    name: &'static str,
    senders: Vec<Sender<T>>,
}

impl<T: Clone + Send + 'static> SubscriptionStorage<T> {
    /// Creates an empty storage; `name` only appears in logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            senders: Vec::new(),
        }
    }

    /// Registers a new subscription with the given buffering policy.
    pub fn create(&mut self, policy: BufferingPolicy) -> Subscription<T> {
        let (tx, rx) = match (policy, policy.capacity()) {
            (BufferingPolicy::BufferingOldest(_), Some(cap)) => {
                let (tx, rx) = mpsc::channel(cap);
                (Sender::Oldest(tx), Receiver::Oldest(rx))
            }
            (BufferingPolicy::BufferingNewest(_), Some(cap)) => {
                let (tx, rx) = broadcast::channel(cap);
                (Sender::Newest(tx), Receiver::Newest(rx))
            }
            _ => {
                let (tx, rx) = mpsc::unbounded_channel();
                (Sender::Unbounded(tx), Receiver::Unbounded(rx))
            }
        };
        self.senders.push(tx);
        Subscription::new(rx)
    }

    /// Fan-out one event to all subscriptions (non-blocking).
    ///
    /// Subscriptions whose consumer was dropped are removed.
    pub fn emit(&mut self, event: &T) {
        let name = self.name;
        self.senders.retain(|sender| match sender {
            Sender::Unbounded(tx) => tx.send(event.clone()).is_ok(),
            Sender::Oldest(tx) => match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscription = name, "dropped event: queue full");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            },
            Sender::Newest(tx) => tx.send(event.clone()).is_ok(),
        });
    }

    /// True if there are no subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Number of subscriptions (including ones dropped since the last emit).
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.len()
    }
}
