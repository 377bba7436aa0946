use super::{
    Action, ActionExecutionParams, ConfigurationAction, ReversibleAction,
    TransactionExecutionParams,
};
use crate::error::KeyNotFoundError;
use crate::feature::IndividualEffect;
use crate::state::{ActivationState, RoutingContext, RoutingKey};
use crate::transition::{TransitionDirection, TransitionElement};

/// Detaches an entry. The entry never gets resolved for this: an unresolved
/// entry has nothing attached.
pub struct DeactivateAction<C> {
    params: TransactionExecutionParams<C>,
    routing: C,
    entry: RoutingContext<C>,
    executed: bool,
    elements: Vec<TransitionElement<C>>,
    reversed: bool,
}

impl<C: RoutingKey> DeactivateAction<C> {
    pub fn create(params: ActionExecutionParams<C>) -> Result<ConfigurationAction<C>, KeyNotFoundError> {
        Self::new(params).map(ConfigurationAction::Deactivate)
    }

    pub(super) fn new(params: ActionExecutionParams<C>) -> Result<Self, KeyNotFoundError> {
        let entry = params.transaction.resolver.lookup(&params.routing)?;
        let mut action = Self {
            params: params.transaction,
            routing: params.routing,
            entry,
            executed: false,
            elements: Vec::new(),
            reversed: false,
        };
        if let RoutingContext::Resolved(resolved) = &action.entry
            && resolved.activation_state == ActivationState::Active
            && let Some(view) = resolved.node.view()
        {
            action.elements.push(TransitionElement {
                routing: action.routing.clone(),
                direction: TransitionDirection::Exit,
                added_or_removed: params.added_or_removed,
                view: view.clone(),
            });
        }
        Ok(action)
    }

    pub fn routing(&self) -> &C {
        &self.routing
    }

    pub(super) fn params(&self) -> &TransactionExecutionParams<C> {
        &self.params
    }

    pub(super) fn entry(&self) -> &RoutingContext<C> {
        &self.entry
    }

    fn is_active(&self) -> bool {
        self.entry.activation_state() == ActivationState::Active
    }

    /// Hand an attached node back to the activator.
    pub(super) fn detach(&self) {
        if let RoutingContext::Resolved(resolved) = &self.entry
            && resolved.activation_state == ActivationState::Active
        {
            self.params.activator.deactivate(&self.routing, &resolved.node);
        }
    }
}

impl<C: RoutingKey> Action<C> for DeactivateAction<C> {
    fn on_before_transition(&mut self) {
        self.executed = self.entry.activation_state() != ActivationState::Inactive;
        if !self.executed {
            tracing::debug!(routing = ?self.routing, "Deactivate skipped, entry already inactive");
            self.elements.clear();
        }
    }

    fn on_transition(&mut self) {
        if self.executed && self.is_active() {
            self.params.emitter.emit(IndividualEffect::PendingDeactivate {
                routing: self.routing.clone(),
                pending: true,
            });
        }
    }

    fn on_finish(&mut self) {
        if !self.executed {
            return;
        }
        if self.reversed {
            if self.is_active() {
                self.params.emitter.emit(IndividualEffect::PendingDeactivate {
                    routing: self.routing.clone(),
                    pending: false,
                });
            }
            return;
        }
        self.detach();
        self.params.emitter.emit(IndividualEffect::Deactivated {
            routing: self.routing.clone(),
            entry: self.entry.with_activation_state(ActivationState::Inactive),
        });
    }

    fn transition_elements(&self) -> &[TransitionElement<C>] {
        &self.elements
    }
}

impl<C: RoutingKey> ReversibleAction<C> for DeactivateAction<C> {
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
