//! Transaction processing against a working state snapshot.

use std::sync::Arc;

use super::EffectEmitter;
use crate::action::{
    Action, ActionExecutionParams, ConfigurationAction, TransactionExecutionParams,
};
use crate::error::CommandExecutionError;
use crate::resolver::{RoutingActivator, RoutingResolver, TransactionResolver};
use crate::scheduler::Scheduler;
use crate::state::{
    ActivationState, MutablePool, ParentContext, Pool, RoutingContext, RoutingKey, WorkingState,
};
use crate::transaction::{
    PoolCommand, RoutingChange, RoutingCommand, Transaction, added_or_removed,
};
use crate::transition::{OngoingTransition, TransitionHandler};

/// Outcome of checking a new transaction against the ongoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewTransitionsExecution {
    /// The transaction reversed an ongoing transition; nothing else to do.
    Abort,
    Continue,
}

pub struct ConfigurationFeatureActor<C> {
    resolver: Arc<dyn RoutingResolver<C>>,
    activator: Arc<dyn RoutingActivator<C>>,
    parent: ParentContext,
    transition_handler: Option<Arc<dyn TransitionHandler<C>>>,
    scheduler: Arc<dyn Scheduler>,
}

impl<C: RoutingKey> ConfigurationFeatureActor<C> {
    pub fn new(
        resolver: Arc<dyn RoutingResolver<C>>,
        activator: Arc<dyn RoutingActivator<C>>,
        parent: ParentContext,
        transition_handler: Option<Arc<dyn TransitionHandler<C>>>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            resolver,
            activator,
            parent,
            transition_handler,
            scheduler,
        }
    }

    pub fn parent(&self) -> &ParentContext {
        &self.parent
    }

    /// Settle the ongoing transitions a new transaction interferes with.
    ///
    /// Effects produced here belong to the interrupted transitions and must be
    /// folded before [`invoke`](Self::invoke) sees the state.
    pub fn interrupt(
        &self,
        state: &WorkingState<C>,
        transaction: &Transaction<C>,
    ) -> NewTransitionsExecution {
        match transaction {
            Transaction::RoutingChange(change) => {
                for ongoing in &state.ongoing_transitions {
                    // A transition that finished meanwhile matches neither.
                    if ongoing.reverse_if_undone_by(&change.descriptor) {
                        tracing::debug!(transition = %ongoing.id(), "Reversed ongoing transition");
                        return NewTransitionsExecution::Abort;
                    }
                    if ongoing.jump_to_end_if_continued_by(&change.descriptor) {
                        tracing::debug!(transition = %ongoing.id(), "Continuation, jumped to end");
                    }
                }
            }
            Transaction::PoolCommand(PoolCommand::Sleep | PoolCommand::Shutdown) => {
                for ongoing in &state.ongoing_transitions {
                    ongoing.jump_to_end();
                }
            }
            Transaction::PoolCommand(PoolCommand::WakeUp) => {}
        }
        NewTransitionsExecution::Continue
    }

    /// Run a transaction. On error nothing was emitted and the state is
    /// unchanged; the emitter is completed either way.
    pub fn invoke(
        &self,
        state: &WorkingState<C>,
        transaction: Transaction<C>,
        emitter: EffectEmitter<C>,
    ) -> Result<(), CommandExecutionError> {
        match transaction {
            Transaction::PoolCommand(command) => {
                let action = command.action();
                let params = self.create_params(
                    state,
                    Pool::new(),
                    action.activation_level(state.activation_level),
                    emitter,
                );
                action.execute(state, &params);
                Ok(())
            }
            Transaction::RoutingChange(change) => self.execute_change(state, change, emitter),
        }
    }

    fn execute_change(
        &self,
        state: &WorkingState<C>,
        change: RoutingChange<C>,
        emitter: EffectEmitter<C>,
    ) -> Result<(), CommandExecutionError> {
        let defaults = create_default_elements(&state.pool, &change.changeset);
        let params = self.create_params(state, defaults, state.activation_level, emitter.clone());

        let mut actions = match self.create_actions(&params, &change.changeset) {
            Ok(actions) => actions,
            Err(err) => {
                for resolved in params.resolver.freshly_resolved() {
                    self.activator.destroy(&resolved.routing, &resolved.node);
                }
                emitter.complete();
                return Err(err);
            }
        };

        for action in &mut actions {
            action.on_before_transition();
        }
        let elements: Vec<_> = actions
            .iter()
            .flat_map(|action| action.transition_elements().iter().cloned())
            .collect();

        match &self.transition_handler {
            Some(handler) if state.activation_level != ActivationState::Sleeping => {
                OngoingTransition::begin(
                    change.descriptor,
                    actions,
                    elements,
                    emitter,
                    Arc::clone(handler),
                    Arc::clone(&self.scheduler),
                );
            }
            _ => {
                tracing::debug!(
                    transaction = %emitter.transaction(),
                    commands = actions.len(),
                    "Applying change synchronously"
                );
                for action in &mut actions {
                    action.on_transition();
                }
                for action in &mut actions {
                    action.on_finish();
                }
                emitter.complete();
            }
        }
        Ok(())
    }

    fn create_params(
        &self,
        state: &WorkingState<C>,
        defaults: Pool<C>,
        global_activation_level: ActivationState,
        emitter: EffectEmitter<C>,
    ) -> TransactionExecutionParams<C> {
        let resolver = TransactionResolver::new(
            Arc::clone(&self.resolver),
            self.parent.clone(),
            state.pool.clone(),
            defaults,
        );
        TransactionExecutionParams {
            emitter,
            resolver: Arc::new(resolver),
            activator: Arc::clone(&self.activator),
            global_activation_level,
        }
    }

    fn create_actions(
        &self,
        params: &TransactionExecutionParams<C>,
        changeset: &[RoutingCommand<C>],
    ) -> Result<Vec<ConfigurationAction<C>>, CommandExecutionError> {
        changeset
            .iter()
            .enumerate()
            .map(|(index, command)| {
                let routing = command.routing().clone();
                tracing::debug!(index, command = command.name(), routing = ?routing, "Creating action");
                let factory = command.action_factory();
                factory(ActionExecutionParams {
                    transaction: params.clone(),
                    command: command.clone(),
                    added_or_removed: added_or_removed(changeset, &routing),
                    routing,
                })
                .map_err(|source| CommandExecutionError {
                    index,
                    command: format!("{:?}", command),
                    source,
                })
            })
            .collect()
    }
}

/// Unresolved `Inactive` entries for every added key the pool doesn't have.
pub fn create_default_elements<C: RoutingKey>(
    pool: &Pool<C>,
    changeset: &[RoutingCommand<C>],
) -> Pool<C> {
    let mut defaults = MutablePool::new();
    for command in changeset {
        if let RoutingCommand::Add(routing) = command
            && !pool.contains_key(routing)
            && !defaults.contains_key(routing)
        {
            defaults.insert(
                routing.clone(),
                RoutingContext::unresolved(routing.clone(), ActivationState::Inactive),
            );
        }
    }
    defaults.freeze()
}
