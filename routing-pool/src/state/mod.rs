//! Pool state: activation levels, routing contexts, pool snapshots and the working state.

mod activation;
mod context;
mod pool;
mod working_state;

pub use activation::ActivationState;
pub use context::{
    Node, NodeId, ParentContext, ResolvedContext, RoutingContext, RoutingKey, UnresolvedContext,
    View, ViewHandle,
};
pub use pool::{MutablePool, Pool};
pub use working_state::WorkingState;
