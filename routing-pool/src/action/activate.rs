use super::{
    Action, ActionExecutionParams, ConfigurationAction, ReversibleAction,
    TransactionExecutionParams,
};
use crate::error::KeyNotFoundError;
use crate::feature::IndividualEffect;
use crate::state::{ActivationState, ResolvedContext, RoutingKey};
use crate::transition::{TransitionDirection, TransitionElement};

/// Resolves an entry and attaches it. While the pool sleeps the entry is only
/// marked `Sleeping`; it gets attached on wake up.
pub struct ActivateAction<C> {
    params: TransactionExecutionParams<C>,
    routing: C,
    added_or_removed: bool,
    /// Entry as it was before this action.
    entry: ResolvedContext<C>,
    fresh: bool,
    executed: bool,
    activated: bool,
    elements: Vec<TransitionElement<C>>,
    reversed: bool,
}

impl<C: RoutingKey> ActivateAction<C> {
    pub fn create(params: ActionExecutionParams<C>) -> Result<ConfigurationAction<C>, KeyNotFoundError> {
        let resolver = &params.transaction.resolver;
        let entry = resolver.resolve(&params.routing)?;
        let fresh = resolver.resolved_by_transaction(&params.routing).is_some();
        Ok(ConfigurationAction::Activate(Self {
            params: params.transaction,
            routing: params.routing,
            added_or_removed: params.added_or_removed,
            entry,
            fresh,
            executed: false,
            activated: false,
            elements: Vec::new(),
            reversed: false,
        }))
    }

    pub fn routing(&self) -> &C {
        &self.routing
    }

    fn target(&self) -> ActivationState {
        match self.params.global_activation_level {
            ActivationState::Sleeping => ActivationState::Sleeping,
            _ => ActivationState::Active,
        }
    }

    fn can_execute(&self, target: ActivationState) -> bool {
        match (self.entry.activation_state, target) {
            (ActivationState::Inactive, _) => true,
            // Desired active but never materialized.
            (ActivationState::Active, ActivationState::Active) => self.fresh,
            (ActivationState::Sleeping, ActivationState::Active) => true,
            _ => false,
        }
    }
}

impl<C: RoutingKey> Action<C> for ActivateAction<C> {
    fn on_before_transition(&mut self) {
        let target = self.target();
        if !self.can_execute(target) {
            tracing::debug!(routing = ?self.routing, state = %self.entry.activation_state, "Activate skipped");
            return;
        }
        self.executed = true;

        if target == ActivationState::Active {
            self.params.activator.activate(&self.routing, &self.entry.node);
            self.activated = true;
            if let Some(view) = self.entry.node.view() {
                self.elements.push(TransitionElement {
                    routing: self.routing.clone(),
                    direction: TransitionDirection::Enter,
                    added_or_removed: self.added_or_removed,
                    view: view.clone(),
                });
            }
        }

        self.params.emitter.emit(IndividualEffect::Activated {
            routing: self.routing.clone(),
            entry: self.entry.with_activation_state(target).into(),
        });
    }

    fn on_transition(&mut self) {}

    fn on_finish(&mut self) {
        if !self.reversed || !self.executed {
            return;
        }
        if self.activated {
            self.params.activator.deactivate(&self.routing, &self.entry.node);
        }
        self.params.emitter.emit(IndividualEffect::Deactivated {
            routing: self.routing.clone(),
            entry: self.entry.clone().into(),
        });
    }

    fn transition_elements(&self) -> &[TransitionElement<C>] {
        &self.elements
    }
}

impl<C: RoutingKey> ReversibleAction<C> for ActivateAction<C> {
    fn reverse(&mut self) {
        self.reversed = !self.reversed;
        for element in &mut self.elements {
            element.direction = element.direction.reverse();
        }
    }

    fn is_reversed(&self) -> bool {
        self.reversed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::testing::Harness;
    use crate::state::{ParentContext, Pool, RoutingContext};
    use crate::test_support::TestResolver;
    use crate::transaction::RoutingCommand;

    fn pool_with(key: &'static str, state: ActivationState) -> Pool<&'static str> {
        Pool::new().with_entry(key, RoutingContext::unresolved(key, state))
    }

    #[test]
    fn activates_and_contributes_entering_element() {
        let mut harness = Harness::new(pool_with("a", ActivationState::Inactive), Pool::new(), ActivationState::Active);
        let mut action = harness.create(RoutingCommand::Activate("a")).unwrap();

        action.on_before_transition();

        assert_eq!(harness.activator.events(), vec!["activate:a"]);
        assert_eq!(harness.effects(), vec!["activated:a=ACTIVE"]);
        let elements = action.transition_elements();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].direction, TransitionDirection::Enter);
        assert_eq!(harness.resolver.resolutions("a"), 1);
    }

    #[test]
    fn sleeping_level_only_marks_entry() {
        let mut harness = Harness::new(pool_with("a", ActivationState::Inactive), Pool::new(), ActivationState::Sleeping);
        let mut action = harness.create(RoutingCommand::Activate("a")).unwrap();

        action.on_before_transition();

        assert!(harness.activator.events().is_empty());
        assert!(action.transition_elements().is_empty());
        assert_eq!(harness.effects(), vec!["activated:a=SLEEPING"]);
    }

    #[test]
    fn already_active_is_a_noop() {
        let resolved = RoutingContext::unresolved("a", ActivationState::Active)
            .resolve(&TestResolver::new(), &ParentContext::new());
        let mut harness = Harness::new(
            Pool::new().with_entry("a", resolved.into()),
            Pool::new(),
            ActivationState::Active,
        );
        let mut action = harness.create(RoutingCommand::Activate("a")).unwrap();

        action.on_before_transition();
        action.reverse();
        action.on_finish();

        assert!(harness.activator.events().is_empty());
        assert!(harness.effects().is_empty());
    }

    #[test]
    fn reversed_activation_is_undone() {
        let mut harness = Harness::new(pool_with("a", ActivationState::Inactive), Pool::new(), ActivationState::Active);
        let mut action = harness.create(RoutingCommand::Activate("a")).unwrap();

        action.on_before_transition();
        action.reverse();
        action.on_finish();

        assert_eq!(action.transition_elements()[0].direction, TransitionDirection::Exit);
        assert_eq!(harness.activator.events(), vec!["activate:a", "deactivate:a"]);
        assert_eq!(harness.effects(), vec!["activated:a=ACTIVE", "deactivated:a=INACTIVE"]);
    }

    #[test]
    fn wakes_an_entry_that_was_never_materialized() {
        let mut harness = Harness::new(pool_with("a", ActivationState::Active), Pool::new(), ActivationState::Active);
        let mut action = harness.create(RoutingCommand::Activate("a")).unwrap();

        action.on_before_transition();

        assert_eq!(harness.activator.events(), vec!["activate:a"]);
        assert_eq!(harness.effects(), vec!["activated:a=ACTIVE"]);
    }

    #[test]
    fn unknown_key_fails_creation() {
        let harness = Harness::new(Pool::new(), Pool::new(), ActivationState::Active);
        assert!(harness.create(RoutingCommand::Activate("ghost")).is_err());
    }
}
