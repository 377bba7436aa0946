use super::{
    Action, ActionExecutionParams, ConfigurationAction, DeactivateAction, ReversibleAction,
};
use crate::error::KeyNotFoundError;
use crate::feature::IndividualEffect;
use crate::state::{RoutingContext, RoutingKey};
use crate::transition::TransitionElement;

/// Deactivates an entry, then drops it from the pool and tears its node down.
pub struct RemoveAction<C> {
    inner: DeactivateAction<C>,
}

impl<C: RoutingKey> RemoveAction<C> {
    pub fn create(params: ActionExecutionParams<C>) -> Result<ConfigurationAction<C>, KeyNotFoundError> {
        let inner = DeactivateAction::new(params)?;
        Ok(ConfigurationAction::Remove(Self { inner }))
    }

    pub fn routing(&self) -> &C {
        self.inner.routing()
    }

    fn emit(&self, effect: IndividualEffect<C>) {
        self.inner.params().emitter.emit(effect);
    }
}

impl<C: RoutingKey> Action<C> for RemoveAction<C> {
    fn on_before_transition(&mut self) {
        self.inner.on_before_transition();
    }

    fn on_transition(&mut self) {
        self.inner.on_transition();
        self.emit(IndividualEffect::PendingRemoval {
            routing: self.routing().clone(),
            pending: true,
        });
    }

    fn on_finish(&mut self) {
        if self.inner.is_reversed() {
            self.inner.on_finish();
            self.emit(IndividualEffect::PendingRemoval {
                routing: self.routing().clone(),
                pending: false,
            });
            return;
        }

        self.inner.detach();
        if let RoutingContext::Resolved(resolved) = self.inner.entry() {
            self.inner
                .params()
                .activator
                .destroy(self.routing(), &resolved.node);
        }
        self.emit(IndividualEffect::Removed {
            routing: self.routing().clone(),
        });
    }

    fn transition_elements(&self) -> &[TransitionElement<C>] {
        self.inner.transition_elements()
    }
}

impl<C: RoutingKey> ReversibleAction<C> for RemoveAction<C> {
    fn reverse(&mut self) {
        self.inner.reverse();
    }

    fn is_reversed(&self) -> bool {
        self.inner.is_reversed()
    }
}
