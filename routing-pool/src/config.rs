//! Feature configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::scheduler::Scheduler;
use crate::state::ActivationState;
use crate::transition::TransitionHandler;

pub struct FeatureConfig<C> {
    /// Bound of the request channel.
    pub channel_capacity: usize,
    /// Tick length of the default scheduler.
    pub frame_interval: Duration,
    pub initial_activation_level: ActivationState,
    /// Without a handler every change applies synchronously.
    pub transition_handler: Option<Arc<dyn TransitionHandler<C>>>,
    /// Replaces the default [`TokioScheduler`](crate::scheduler::TokioScheduler).
    pub scheduler: Option<Arc<dyn Scheduler>>,
}

impl<C> Default for FeatureConfig<C> {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            frame_interval: Duration::from_millis(16),
            initial_activation_level: ActivationState::Active,
            transition_handler: None,
            scheduler: None,
        }
    }
}

impl<C> FeatureConfig<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, overridden by `ROUTING_FRAME_INTERVAL_MS` and
    /// `ROUTING_CHANNEL_CAPACITY` when set and valid.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_parse::<u64>("ROUTING_FRAME_INTERVAL_MS") {
            config.frame_interval = Duration::from_millis(ms);
        }
        if let Some(capacity) = env_parse::<usize>("ROUTING_CHANNEL_CAPACITY").filter(|c| *c > 0) {
            config.channel_capacity = capacity;
        }
        config
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_initial_activation_level(mut self, level: ActivationState) -> Self {
        self.initial_activation_level = level;
        self
    }

    pub fn with_transition_handler(mut self, handler: Arc<dyn TransitionHandler<C>>) -> Self {
        self.transition_handler = Some(handler);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring invalid environment value");
            None
        }
    }
}
