//! Routing contexts: the unresolved/resolved entries held by a [`Pool`](super::Pool).
//!
//! Nodes are referenced by id only. A node knows its parent's id, never the
//! parent itself, so swapping a whole pool never leaves dangling references.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use super::ActivationState;
use crate::resolver::RoutingResolver;

/// Bounds every routing key must satisfy.
pub trait RoutingKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> RoutingKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Unique identifier for a materialized node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct NodeId(uuid::Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The only view capability the pool needs: hiding entering views until the
/// transition handler has measured them.
pub trait View: Send + Sync {
    fn set_visible(&self, visible: bool);
}

pub type ViewHandle = Arc<dyn View>;

/// Opaque handle identifying the composite that owns the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentContext {
    id: NodeId,
}

impl ParentContext {
    pub fn new() -> Self {
        Self { id: NodeId::new() }
    }

    pub fn with_id(id: NodeId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl Default for ParentContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A materialized child produced by a [`RoutingResolver`].
#[derive(Clone)]
pub struct Node {
    id: NodeId,
    parent: NodeId,
    view: Option<ViewHandle>,
}

impl Node {
    pub fn new(parent: &ParentContext, view: Option<ViewHandle>) -> Self {
        Self {
            id: NodeId::new(),
            parent: parent.id(),
            view,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn view(&self) -> Option<&ViewHandle> {
        self.view.as_ref()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("has_view", &self.view.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedContext<C> {
    pub routing: C,
    /// The state the entry should take once resolved.
    pub activation_state: ActivationState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext<C> {
    pub routing: C,
    pub activation_state: ActivationState,
    pub node: Node,
}

impl<C: Clone> ResolvedContext<C> {
    pub fn with_activation_state(&self, activation_state: ActivationState) -> Self {
        Self {
            routing: self.routing.clone(),
            activation_state,
            node: self.node.clone(),
        }
    }
}

impl<C> From<ResolvedContext<C>> for RoutingContext<C> {
    fn from(resolved: ResolvedContext<C>) -> Self {
        RoutingContext::Resolved(resolved)
    }
}

/// A pool entry, either waiting to be materialized or already backed by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingContext<C> {
    Unresolved(UnresolvedContext<C>),
    Resolved(ResolvedContext<C>),
}

impl<C: RoutingKey> RoutingContext<C> {
    pub fn unresolved(routing: C, activation_state: ActivationState) -> Self {
        Self::Unresolved(UnresolvedContext {
            routing,
            activation_state,
        })
    }

    pub fn routing(&self) -> &C {
        match self {
            Self::Unresolved(c) => &c.routing,
            Self::Resolved(c) => &c.routing,
        }
    }

    pub fn activation_state(&self) -> ActivationState {
        match self {
            Self::Unresolved(c) => c.activation_state,
            Self::Resolved(c) => c.activation_state,
        }
    }

    pub fn with_activation_state(&self, activation_state: ActivationState) -> Self {
        match self {
            Self::Unresolved(c) => Self::unresolved(c.routing.clone(), activation_state),
            Self::Resolved(c) => Self::Resolved(c.with_activation_state(activation_state)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn as_resolved(&self) -> Option<&ResolvedContext<C>> {
        match self {
            Self::Resolved(c) => Some(c),
            Self::Unresolved(_) => None,
        }
    }

    /// Materialize this entry. Already resolved entries are returned as they are.
    ///
    /// Reads nothing but its inputs; the caller decides where the result goes.
    pub fn resolve<R>(&self, resolver: &R, parent: &ParentContext) -> ResolvedContext<C>
    where
        R: RoutingResolver<C> + ?Sized,
    {
        match self {
            Self::Resolved(c) => c.clone(),
            Self::Unresolved(c) => ResolvedContext {
                routing: c.routing.clone(),
                activation_state: c.activation_state,
                node: resolver.resolve(&c.routing, parent),
            },
        }
    }
}
