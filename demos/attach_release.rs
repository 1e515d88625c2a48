//! # Attach / Release Example
//!
//! Builds a room from three in-memory channels, attaches it, simulates a
//! transport hiccup on the presence channel, and finally releases the room.
//!
//! Prints every public status change as it happens:
//! ```text
//! initialized ─► attaching ─► attached ─► suspended ─► attaching ─► attached ─► releasing ─► released
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example attach_release
//! ```

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use roomvisor::{
    BufferingPolicy, ChannelError, ChannelState, ChannelStateChange, Contributor, ContributorId,
    DiscontinuityEvent, RealtimeChannel, RoomFeature, RoomLifecycleManager, Subscription,
    SubscriptionStorage,
};

/// Channel that attaches and detaches after a short delay.
struct ToyChannel {
    state: Mutex<ChannelState>,
    changes: Mutex<SubscriptionStorage<ChannelStateChange>>,
}

impl ToyChannel {
    fn new() -> Self {
        Self {
            state: Mutex::new(ChannelState::Initialized),
            changes: Mutex::new(SubscriptionStorage::new("toy_channel")),
        }
    }

    fn move_to(&self, next: ChannelState, reason: Option<ChannelError>) {
        let previous = std::mem::replace(&mut *self.state.lock(), next);
        self.changes
            .lock()
            .emit(&ChannelStateChange::transition(previous, next, reason));
    }
}

#[async_trait]
impl RealtimeChannel for ToyChannel {
    fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    fn error_reason(&self) -> Option<ChannelError> {
        None
    }

    fn subscribe_to_state(&self, policy: BufferingPolicy) -> Subscription<ChannelStateChange> {
        self.changes.lock().create(policy)
    }

    async fn attach(&self) -> Result<(), ChannelError> {
        self.move_to(ChannelState::Attaching, None);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.move_to(ChannelState::Attached, None);
        Ok(())
    }

    async fn detach(&self) -> Result<(), ChannelError> {
        self.move_to(ChannelState::Detaching, None);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.move_to(ChannelState::Detached, None);
        Ok(())
    }
}

struct ToyContributor {
    id: ContributorId,
    feature: RoomFeature,
    channel: ToyChannel,
}

impl Contributor for ToyContributor {
    fn id(&self) -> ContributorId {
        self.id.clone()
    }

    fn feature(&self) -> RoomFeature {
        self.feature
    }

    fn channel(&self) -> &dyn RealtimeChannel {
        &self.channel
    }

    fn emit_discontinuity(&self, event: DiscontinuityEvent) {
        println!("  [{}] discontinuity: {:?}", self.id, event.error);
    }
}

fn contributor(id: &str, feature: RoomFeature) -> Arc<ToyContributor> {
    Arc::new(ToyContributor {
        id: ContributorId::new(id),
        feature,
        channel: ToyChannel::new(),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), roomvisor::RoomError> {
    let messages = contributor("messages", RoomFeature::Messages);
    let presence = contributor("presence", RoomFeature::Presence);
    let typing = contributor("typing", RoomFeature::Typing);

    let manager = RoomLifecycleManager::new(vec![
        messages.clone() as Arc<dyn Contributor>,
        presence.clone() as Arc<dyn Contributor>,
        typing.clone() as Arc<dyn Contributor>,
    ]);

    let mut changes = manager.on_room_status_change(BufferingPolicy::Unbounded);
    let printer = tokio::spawn(async move {
        while let Some(change) = changes.next().await {
            println!("room: {:?} -> {:?}", change.previous, change.current);
        }
    });

    println!("attaching...");
    manager.perform_attach_operation().await?;

    println!("presence drops out...");
    presence.channel.move_to(
        ChannelState::Suspended,
        Some(ChannelError::new(80_002, 500, "connection lost")),
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    presence.channel.move_to(ChannelState::Attached, None);
    tokio::time::sleep(Duration::from_millis(200)).await;

    println!("releasing...");
    manager.perform_release_operation().await;

    drop(manager);
    let _ = printer.await;
    Ok(())
}
