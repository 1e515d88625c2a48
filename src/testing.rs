//! Test doubles for contributors and their channels.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    contributor::{
        ChannelState, ChannelStateChange, Contributor, ContributorId, DiscontinuityEvent,
        RealtimeChannel, RoomFeature,
    },
    error::ChannelError,
    subscription::{BufferingPolicy, Subscription, SubscriptionStorage},
};

/// Scripted outcome of one `attach()` / `detach()` call.
#[derive(Clone, Debug)]
pub(crate) struct MockResult {
    delay: Duration,
    failure: Option<(ChannelState, ChannelError)>,
}

impl MockResult {
    /// The call succeeds and the channel reaches ATTACHED / DETACHED.
    pub(crate) fn success() -> Self {
        Self {
            delay: Duration::ZERO,
            failure: None,
        }
    }

    /// The call fails with `error`, leaving the channel in `state`.
    pub(crate) fn failure(state: ChannelState, error: ChannelError) -> Self {
        Self {
            delay: Duration::ZERO,
            failure: Some((state, error)),
        }
    }

    /// Completes only after `delay`.
    pub(crate) fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

struct Inner {
    state: ChannelState,
    error_reason: Option<ChannelError>,
    attach_results: VecDeque<MockResult>,
    detach_results: VecDeque<MockResult>,
    attach_default: MockResult,
    detach_default: MockResult,
    changes: SubscriptionStorage<ChannelStateChange>,
    on_state_read: Option<Arc<dyn Fn() + Send + Sync>>,
    attach_calls: usize,
    detach_calls: usize,
}

/// In-memory [`RealtimeChannel`] with scripted attach/detach results.
pub(crate) struct MockChannel {
    inner: Mutex<Inner>,
}

impl MockChannel {
    pub(crate) fn new(state: ChannelState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state,
                error_reason: None,
                attach_results: VecDeque::new(),
                detach_results: VecDeque::new(),
                attach_default: MockResult::success(),
                detach_default: MockResult::success(),
                changes: SubscriptionStorage::new("mock_channel"),
                on_state_read: None,
                attach_calls: 0,
                detach_calls: 0,
            }),
        }
    }

    /// Queues results for the next `attach()` calls; afterwards calls succeed.
    pub(crate) fn script_attach(&self, results: impl IntoIterator<Item = MockResult>) {
        self.inner.lock().attach_results.extend(results);
    }

    /// Queues results for the next `detach()` calls; afterwards calls succeed.
    pub(crate) fn script_detach(&self, results: impl IntoIterator<Item = MockResult>) {
        self.inner.lock().detach_results.extend(results);
    }

    /// Result of every `detach()` call once the script is exhausted.
    pub(crate) fn default_detach(&self, result: MockResult) {
        self.inner.lock().detach_default = result;
    }

    /// Moves to `state` and emits the transition.
    pub(crate) fn transition(&self, state: ChannelState, reason: Option<ChannelError>) {
        let previous = self.inner.lock().state;
        self.apply(ChannelStateChange::transition(previous, state, reason));
    }

    /// Emits an UPDATE in the current state.
    pub(crate) fn emit_update(&self, resumed: bool, reason: Option<ChannelError>) {
        let state = self.inner.lock().state;
        self.apply(ChannelStateChange::update(state, resumed, reason));
    }

    /// Adopts `change.current` / `change.reason` and emits `change`.
    pub(crate) fn apply(&self, change: ChannelStateChange) {
        let mut inner = self.inner.lock();
        inner.state = change.current;
        inner.error_reason = change.reason.clone();
        inner.changes.emit(&change);
    }

    /// Changes state without emitting anything.
    pub(crate) fn set_state(&self, state: ChannelState) {
        self.inner.lock().state = state;
    }

    /// Runs `hook` on every `state()` call, outside the channel's own lock.
    pub(crate) fn on_state_read(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.inner.lock().on_state_read = Some(Arc::new(hook));
    }

    pub(crate) fn attach_calls(&self) -> usize {
        self.inner.lock().attach_calls
    }

    pub(crate) fn detach_calls(&self) -> usize {
        self.inner.lock().detach_calls
    }

    async fn perform(&self, result: MockResult, target: ChannelState) -> Result<(), ChannelError> {
        if !result.delay.is_zero() {
            tokio::time::sleep(result.delay).await;
        }
        match result.failure {
            None => {
                if self.state() != target {
                    self.transition(target, None);
                }
                Ok(())
            }
            Some((state, error)) => {
                self.transition(state, Some(error.clone()));
                Err(error)
            }
        }
    }
}

#[async_trait]
impl RealtimeChannel for MockChannel {
    fn state(&self) -> ChannelState {
        let (state, hook) = {
            let inner = self.inner.lock();
            (inner.state, inner.on_state_read.clone())
        };
        if let Some(hook) = hook {
            hook();
        }
        state
    }

    fn error_reason(&self) -> Option<ChannelError> {
        self.inner.lock().error_reason.clone()
    }

    fn subscribe_to_state(&self, policy: BufferingPolicy) -> Subscription<ChannelStateChange> {
        self.inner.lock().changes.create(policy)
    }

    async fn attach(&self) -> Result<(), ChannelError> {
        let result = {
            let mut inner = self.inner.lock();
            inner.attach_calls += 1;
            match inner.attach_results.pop_front() {
                Some(result) => result,
                None => inner.attach_default.clone(),
            }
        };
        self.perform(result, ChannelState::Attached).await
    }

    async fn detach(&self) -> Result<(), ChannelError> {
        let result = {
            let mut inner = self.inner.lock();
            inner.detach_calls += 1;
            match inner.detach_results.pop_front() {
                Some(result) => result,
                None => inner.detach_default.clone(),
            }
        };
        self.perform(result, ChannelState::Detached).await
    }
}

/// [`Contributor`] over a [`MockChannel`] that records its discontinuities.
pub(crate) struct MockContributor {
    id: ContributorId,
    feature: RoomFeature,
    pub(crate) channel: MockChannel,
    discontinuities: Mutex<Vec<DiscontinuityEvent>>,
}

impl MockContributor {
    pub(crate) fn new(id: &str, feature: RoomFeature) -> Arc<Self> {
        Arc::new(Self {
            id: ContributorId::new(id),
            feature,
            channel: MockChannel::new(ChannelState::Initialized),
            discontinuities: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn discontinuities(&self) -> Vec<DiscontinuityEvent> {
        self.discontinuities.lock().clone()
    }
}

impl Contributor for MockContributor {
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
        self.discontinuities.lock().push(event);
    }
}

/// Erases mock contributors for the manager.
pub(crate) fn contributors(mocks: &[Arc<MockContributor>]) -> Vec<Arc<dyn Contributor>> {
    mocks
        .iter()
        .map(|mock| Arc::clone(mock) as Arc<dyn Contributor>)
        .collect()
}

/// Lets every ready task run (under paused time this also advances the clock by 1ms).
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub(crate) fn channel_error(message: &str) -> ChannelError {
    ChannelError::new(80_000, 500, message)
}
