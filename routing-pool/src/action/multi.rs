use super::TransactionExecutionParams;
use crate::feature::GlobalEffect;
use crate::state::{ActivationState, RoutingContext, RoutingKey, WorkingState};

/// Pool-wide commands. They always apply synchronously, never animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiConfigurationAction {
    Sleep,
    WakeUp,
    Shutdown,
}

impl MultiConfigurationAction {
    /// Level the transaction runs at.
    pub fn activation_level(&self, current: ActivationState) -> ActivationState {
        match self {
            Self::Sleep => ActivationState::Sleeping,
            Self::WakeUp => ActivationState::Active,
            Self::Shutdown => current,
        }
    }

    pub fn execute<C: RoutingKey>(
        &self,
        state: &WorkingState<C>,
        params: &TransactionExecutionParams<C>,
    ) {
        let activator = &params.activator;
        for (routing, entry) in state.pool.iter() {
            let RoutingContext::Resolved(resolved) = entry else {
                continue;
            };
            match (self, resolved.activation_state) {
                (Self::Sleep, ActivationState::Active) => {
                    activator.deactivate(routing, &resolved.node);
                }
                (Self::WakeUp, ActivationState::Sleeping) => {
                    activator.activate(routing, &resolved.node);
                }
                (Self::Shutdown, current) => {
                    if current == ActivationState::Active {
                        activator.deactivate(routing, &resolved.node);
                    }
                    activator.destroy(routing, &resolved.node);
                }
                _ => {}
            }
        }

        let effect = match self {
            Self::Sleep => GlobalEffect::Sleep,
            Self::WakeUp => GlobalEffect::WakeUp,
            Self::Shutdown => GlobalEffect::Shutdown,
        };
        tracing::debug!(action = ?self, entries = state.pool.len(), "Executed pool command");
        params.emitter.emit(effect);
        params.emitter.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::testing::Harness;
    use crate::state::{ParentContext, Pool};
    use crate::test_support::TestResolver;

    fn state() -> WorkingState<&'static str> {
        let resolver = TestResolver::new();
        let parent = ParentContext::new();
        let resolved = |key: &'static str, level: ActivationState| -> RoutingContext<&'static str> {
            RoutingContext::unresolved(key, level)
                .resolve(&resolver, &parent)
                .into()
        };
        let mut state = WorkingState::default();
        state.pool = Pool::new()
            .with_entry("active", resolved("active", ActivationState::Active))
            .with_entry("sleeping", resolved("sleeping", ActivationState::Sleeping))
            .with_entry("inactive", resolved("inactive", ActivationState::Inactive))
            .with_entry("lazy", RoutingContext::unresolved("lazy", ActivationState::Active));
        state
    }

    #[test]
    fn sleep_detaches_active_entries() {
        let mut harness = Harness::new(Pool::new(), Pool::new(), ActivationState::Sleeping);

        MultiConfigurationAction::Sleep.execute(&state(), &harness.params);

        assert_eq!(harness.activator.events(), vec!["deactivate:active"]);
        assert_eq!(harness.effects(), vec!["global:Sleep", "complete"]);
    }

    #[test]
    fn wake_up_attaches_sleeping_entries() {
        let mut harness = Harness::new(Pool::new(), Pool::new(), ActivationState::Active);

        MultiConfigurationAction::WakeUp.execute(&state(), &harness.params);

        assert_eq!(harness.activator.events(), vec!["activate:sleeping"]);
        assert_eq!(harness.effects(), vec!["global:WakeUp", "complete"]);
    }

    #[test]
    fn shutdown_tears_down_every_node() {
        let mut harness = Harness::new(Pool::new(), Pool::new(), ActivationState::Active);

        MultiConfigurationAction::Shutdown.execute(&state(), &harness.params);

        assert_eq!(
            harness.activator.events(),
            vec![
                "deactivate:active",
                "destroy:active",
                "destroy:sleeping",
                "destroy:inactive",
            ]
        );
        assert_eq!(harness.effects(), vec!["global:Shutdown", "complete"]);
    }

    #[test]
    fn level_override() {
        use ActivationState::*;
        assert_eq!(MultiConfigurationAction::Sleep.activation_level(Active), Sleeping);
        assert_eq!(MultiConfigurationAction::WakeUp.activation_level(Sleeping), Active);
        assert_eq!(MultiConfigurationAction::Shutdown.activation_level(Sleeping), Sleeping);
    }
}
