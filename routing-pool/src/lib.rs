//! routing-pool: configuration pool and transition orchestration for composite routers.

pub mod action;
pub mod config;
pub mod error;
pub mod feature;
pub mod logging;
pub mod resolver;
pub mod scheduler;
pub mod state;
pub mod transaction;
pub mod transition;

#[cfg(test)]
mod test_support;

pub use action::{
    ActionExecutionParams, ConfigurationAction, MultiConfigurationAction, ReversibleAction,
    TransactionExecutionParams,
};
pub use config::FeatureConfig;
pub use error::{CommandExecutionError, FeatureError, KeyNotFoundError};
pub use feature::{
    ConfigurationFeature, ConfigurationFeatureActor, Effect, EffectEmitter, PendingTransaction,
    TransactionId,
};
pub use resolver::{RoutingActivator, RoutingResolver, TransactionResolver};
pub use scheduler::{ScheduledCallback, Scheduler, TokioScheduler};
pub use state::{
    ActivationState, MutablePool, Node, NodeId, ParentContext, Pool, ResolvedContext,
    RoutingContext, RoutingKey, UnresolvedContext, View, ViewHandle, WorkingState,
};
pub use transaction::{PoolCommand, RoutingChange, RoutingCommand, Transaction, TransitionDescriptor};
pub use transition::{
    OngoingTransition, Transition, TransitionDirection, TransitionElement, TransitionHandler,
    TransitionId, TransitionPair,
};
