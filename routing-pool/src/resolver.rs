//! Collaborators that materialize and (de)activate pool entries, plus the
//! per-transaction resolver that memoizes resolution.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::KeyNotFoundError;
use crate::state::{
    MutablePool, Node, ParentContext, Pool, ResolvedContext, RoutingContext, RoutingKey,
};

/// Materializes a routing key into a node. Must not depend on pool contents.
pub trait RoutingResolver<C>: Send + Sync {
    fn resolve(&self, routing: &C, parent: &ParentContext) -> Node;
}

impl<C, F> RoutingResolver<C> for F
where
    F: Fn(&C, &ParentContext) -> Node + Send + Sync,
{
    fn resolve(&self, routing: &C, parent: &ParentContext) -> Node {
        self(routing, parent)
    }
}

/// Applies activation changes to resolved children. Only called from action hooks.
pub trait RoutingActivator<C>: Send + Sync {
    fn activate(&self, routing: &C, node: &Node);

    fn deactivate(&self, routing: &C, node: &Node);

    /// Tear down a node whose key left the pool.
    fn destroy(&self, routing: &C, node: &Node) {
        let _ = (routing, node);
    }
}

/// Resolver handed to the actions of a single transaction.
///
/// Lookups go memo → batch defaults → pool. Every key resolves at most once
/// per transaction; the memo is dropped with the transaction.
pub struct TransactionResolver<C> {
    resolver: Arc<dyn RoutingResolver<C>>,
    parent: ParentContext,
    pool: Pool<C>,
    defaults: Pool<C>,
    memo: Mutex<MutablePool<C>>,
}

impl<C: RoutingKey> TransactionResolver<C> {
    pub fn new(
        resolver: Arc<dyn RoutingResolver<C>>,
        parent: ParentContext,
        pool: Pool<C>,
        defaults: Pool<C>,
    ) -> Self {
        let memo = Mutex::new(pool.to_mutable());
        Self {
            resolver,
            parent,
            pool,
            defaults,
            memo,
        }
    }

    fn memo(&self) -> MutexGuard<'_, MutablePool<C>> {
        // The memo holds plain data, so a poisoned lock is still consistent.
        self.memo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn source(&self, routing: &C) -> Result<RoutingContext<C>, KeyNotFoundError> {
        self.defaults
            .get(routing)
            .or_else(|| self.pool.get(routing))
            .cloned()
            .ok_or_else(|| KeyNotFoundError::new(routing, self.pool.keys()))
    }

    /// The entry for `routing` without materializing it.
    pub fn lookup(&self, routing: &C) -> Result<RoutingContext<C>, KeyNotFoundError> {
        if let Some(entry @ RoutingContext::Resolved(_)) = self.memo().get(routing) {
            return Ok(entry.clone());
        }
        self.source(routing)
    }

    pub fn resolve(&self, routing: &C) -> Result<ResolvedContext<C>, KeyNotFoundError> {
        let mut memo = self.memo();
        if let Some(RoutingContext::Resolved(resolved)) = memo.get(routing) {
            return Ok(resolved.clone());
        }

        let resolved = self.source(routing)?.resolve(&*self.resolver, &self.parent);
        tracing::debug!(routing = ?routing, node = %resolved.node.id(), "Resolved routing");
        memo.insert(routing.clone(), resolved.clone().into());
        Ok(resolved)
    }

    /// The entry for a key that is part of this batch's defaults, if any.
    pub fn default_entry(&self, routing: &C) -> Option<RoutingContext<C>> {
        self.defaults.get(routing).cloned()
    }

    /// Entry resolved during this transaction (the pool held it unresolved or not at all).
    pub fn resolved_by_transaction(&self, routing: &C) -> Option<ResolvedContext<C>> {
        if self.pool.get(routing).is_some_and(RoutingContext::is_resolved) {
            return None;
        }
        self.memo().get(routing).and_then(RoutingContext::as_resolved).cloned()
    }

    /// Every entry this transaction materialized, in resolution order.
    pub fn freshly_resolved(&self) -> Vec<ResolvedContext<C>> {
        self.memo()
            .iter()
            .filter(|(routing, _)| !self.pool.get(routing).is_some_and(RoutingContext::is_resolved))
            .filter_map(|(_, entry)| entry.as_resolved().cloned())
            .collect()
    }

    pub fn parent(&self) -> &ParentContext {
        &self.parent
    }
}
