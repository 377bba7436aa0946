//! Actions: the unit of work bound to one command of a transaction.
//!
//! Hooks run in a fixed order: `on_before_transition` for the whole batch,
//! then `on_transition` once drivers start, then `on_finish`. An action emits
//! its pool changes as effects; it never touches the working state directly.

mod activate;
mod add;
mod deactivate;
mod multi;
mod remove;

use std::sync::Arc;

pub use activate::ActivateAction;
pub use add::AddAction;
pub use deactivate::DeactivateAction;
pub use multi::MultiConfigurationAction;
pub use remove::RemoveAction;

use crate::error::KeyNotFoundError;
use crate::feature::EffectEmitter;
use crate::resolver::{RoutingActivator, TransactionResolver};
use crate::state::{ActivationState, RoutingKey};
use crate::transaction::RoutingCommand;
use crate::transition::TransitionElement;

pub trait Action<C>: Send {
    fn on_before_transition(&mut self);

    fn on_transition(&mut self);

    fn on_finish(&mut self);

    fn transition_elements(&self) -> &[TransitionElement<C>];
}

pub trait ReversibleAction<C>: Action<C> {
    /// Flip the action. Finishing a reversed action undoes what it did so far.
    fn reverse(&mut self);

    fn is_reversed(&self) -> bool;
}

/// Builds the action for one command.
pub type ActionFactory<C> =
    fn(ActionExecutionParams<C>) -> Result<ConfigurationAction<C>, KeyNotFoundError>;

/// Shared by every action of one transaction.
pub struct TransactionExecutionParams<C> {
    pub emitter: EffectEmitter<C>,
    pub resolver: Arc<TransactionResolver<C>>,
    pub activator: Arc<dyn RoutingActivator<C>>,
    /// Effective level for this transaction (`Sleep`/`WakeUp` override the state's).
    pub global_activation_level: ActivationState,
}

impl<C> Clone for TransactionExecutionParams<C> {
    fn clone(&self) -> Self {
        Self {
            emitter: self.emitter.clone(),
            resolver: Arc::clone(&self.resolver),
            activator: Arc::clone(&self.activator),
            global_activation_level: self.global_activation_level,
        }
    }
}

pub struct ActionExecutionParams<C> {
    pub transaction: TransactionExecutionParams<C>,
    pub command: RoutingCommand<C>,
    pub routing: C,
    /// The key enters or leaves the pool somewhere in the same batch.
    pub added_or_removed: bool,
}

pub enum ConfigurationAction<C> {
    Add(AddAction<C>),
    Remove(RemoveAction<C>),
    Activate(ActivateAction<C>),
    Deactivate(DeactivateAction<C>),
}

impl<C: RoutingKey> ConfigurationAction<C> {
    pub fn routing(&self) -> &C {
        match self {
            Self::Add(a) => a.routing(),
            Self::Remove(a) => a.routing(),
            Self::Activate(a) => a.routing(),
            Self::Deactivate(a) => a.routing(),
        }
    }

    fn as_action(&self) -> &dyn ReversibleAction<C> {
        match self {
            Self::Add(a) => a,
            Self::Remove(a) => a,
            Self::Activate(a) => a,
            Self::Deactivate(a) => a,
        }
    }

    fn as_action_mut(&mut self) -> &mut dyn ReversibleAction<C> {
        match self {
            Self::Add(a) => a,
            Self::Remove(a) => a,
            Self::Activate(a) => a,
            Self::Deactivate(a) => a,
        }
    }
}

impl<C: RoutingKey> Action<C> for ConfigurationAction<C> {
    fn on_before_transition(&mut self) {
        self.as_action_mut().on_before_transition()
    }

    fn on_transition(&mut self) {
        self.as_action_mut().on_transition()
    }

    fn on_finish(&mut self) {
        self.as_action_mut().on_finish()
    }

    fn transition_elements(&self) -> &[TransitionElement<C>] {
        self.as_action().transition_elements()
    }
}

impl<C: RoutingKey> ReversibleAction<C> for ConfigurationAction<C> {
    fn reverse(&mut self) {
        self.as_action_mut().reverse()
    }

    fn is_reversed(&self) -> bool {
        self.as_action().is_reversed()
    }
}

impl<C: RoutingKey> std::fmt::Debug for ConfigurationAction<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Add(_) => "Add",
            Self::Remove(_) => "Remove",
            Self::Activate(_) => "Activate",
            Self::Deactivate(_) => "Deactivate",
        };
        f.debug_struct(kind)
            .field("routing", self.routing())
            .field("reversed", &self.is_reversed())
            .finish()
    }
}
