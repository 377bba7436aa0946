use super::{
    Action, ActionExecutionParams, ConfigurationAction, ReversibleAction,
    TransactionExecutionParams,
};
use crate::error::KeyNotFoundError;
use crate::feature::IndividualEffect;
use crate::state::{RoutingContext, RoutingKey};
use crate::transition::TransitionElement;

/// Inserts a key absent from the pool, materialized but `Inactive`.
pub struct AddAction<C> {
    params: TransactionExecutionParams<C>,
    routing: C,
    /// `None` when the key was already in the pool: nothing to add or undo.
    entry: Option<RoutingContext<C>>,
    reversed: bool,
}

impl<C: RoutingKey> AddAction<C> {
    pub fn create(params: ActionExecutionParams<C>) -> Result<ConfigurationAction<C>, KeyNotFoundError> {
        let resolver = &params.transaction.resolver;
        let entry = match resolver.default_entry(&params.routing) {
            Some(_) => Some(RoutingContext::from(resolver.resolve(&params.routing)?)),
            None => None,
        };
        Ok(ConfigurationAction::Add(Self {
            params: params.transaction,
            routing: params.routing,
            entry,
            reversed: false,
        }))
    }

    pub fn routing(&self) -> &C {
        &self.routing
    }
}

impl<C: RoutingKey> Action<C> for AddAction<C> {
    fn on_before_transition(&mut self) {
        if let Some(entry) = &self.entry {
            self.params.emitter.emit(IndividualEffect::Added {
                routing: self.routing.clone(),
                entry: entry.clone(),
            });
        }
    }

    fn on_transition(&mut self) {}

    fn on_finish(&mut self) {
        if !self.reversed || self.entry.is_none() {
            return;
        }
        if let Some(resolved) = self.params.resolver.resolved_by_transaction(&self.routing) {
            self.params.activator.destroy(&self.routing, &resolved.node);
        }
        self.params.emitter.emit(IndividualEffect::Removed {
            routing: self.routing.clone(),
        });
    }

    fn transition_elements(&self) -> &[TransitionElement<C>] {
        &[]
    }
}

impl<C: RoutingKey> ReversibleAction<C> for AddAction<C> {
    fn reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    fn is_reversed(&self) -> bool {
        self.reversed
    }
}
