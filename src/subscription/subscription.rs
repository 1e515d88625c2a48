//! # Subscription: the consumer side of a [`SubscriptionStorage`](super::SubscriptionStorage).

use futures::Stream;
use tokio::sync::{
    broadcast::{
        self,
        error::{RecvError, TryRecvError},
    },
    mpsc,
};

/// Queue backing one subscription, chosen by its buffering policy.
pub(super) enum Receiver<T> {
    Unbounded(mpsc::UnboundedReceiver<T>),
    Oldest(mpsc::Receiver<T>),
    Newest(broadcast::Receiver<T>),
}

/// Independent, buffered sequence of events.
///
/// Dropping the subscription unsubscribes it; the producer prunes it on its next emit.
pub struct Subscription<T> {
    rx: Receiver<T>,
}

impl<T: Clone + Send + 'static> Subscription<T> {
    pub(super) fn new(rx: Receiver<T>) -> Self {
        Self { rx }
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the producer has gone away and the queue is drained.
    pub async fn next(&mut self) -> Option<T> {
        match &mut self.rx {
            Receiver::Unbounded(rx) => rx.recv().await,
            Receiver::Oldest(rx) => rx.recv().await,
            Receiver::Newest(rx) => loop {
                match rx.recv().await {
                    Ok(ev) => return Some(ev),
                    // Overwritten events are the policy's intended loss.
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return None,
                }
            },
        }
    }

    /// Returns an already-buffered event without waiting.
    pub fn try_next(&mut self) -> Option<T> {
        match &mut self.rx {
            Receiver::Unbounded(rx) => rx.try_recv().ok(),
            Receiver::Oldest(rx) => rx.try_recv().ok(),
            Receiver::Newest(rx) => loop {
                match rx.try_recv() {
                    Ok(ev) => return Some(ev),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
                }
            },
        }
    }

    /// Converts the subscription into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = T> + Send + 'static {
        futures::stream::unfold(self, |mut sub| async move {
            let ev = sub.next().await?;
            Some((ev, sub))
        })
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.rx {
            Receiver::Unbounded(_) => "unbounded",
            Receiver::Oldest(_) => "buffering_oldest",
            Receiver::Newest(_) => "buffering_newest",
        };
        f.debug_struct("Subscription").field("queue", &kind).finish()
    }
}
