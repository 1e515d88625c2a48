use std::sync::Arc;

use crate::{
    clock::{Clock, TokioClock},
    contributor::Contributor,
};

use super::{config::LifecycleConfig, manager::RoomLifecycleManager, manager::Shared};

/// Builder for constructing a [`RoomLifecycleManager`] with optional settings.
pub struct LifecycleManagerBuilder {
    contributors: Vec<Arc<dyn Contributor>>,
    cfg: LifecycleConfig,
    clock: Arc<dyn Clock>,
}

impl LifecycleManagerBuilder {
    /// Creates a builder over `contributors` with the default config and [`TokioClock`].
    pub fn new(contributors: Vec<Arc<dyn Contributor>>) -> Self {
        Self {
            contributors,
            cfg: LifecycleConfig::default(),
            clock: Arc::new(TokioClock),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: LifecycleConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Replaces the clock used for every pause the manager takes.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the manager.
    ///
    /// This consumes the builder and starts one state listener per
    /// contributor, so it must be called inside a tokio runtime.
    pub fn build(self) -> RoomLifecycleManager {
        let shared = Shared::new(self.contributors, self.clock, self.cfg);
        RoomLifecycleManager::from_shared(shared)
    }
}
