//! Keyed pool of routing contexts.
//!
//! [`Pool`] is an immutable snapshot: every update returns a new pool and leaves
//! the original untouched. [`MutablePool`] is the scratch variant used while a
//! single transaction is processed.

use std::sync::Arc;

use indexmap::IndexMap;

use super::{RoutingContext, RoutingKey};

pub struct Pool<C> {
    entries: Arc<IndexMap<C, RoutingContext<C>>>,
}

impl<C> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<C> Default for Pool<C> {
    fn default() -> Self {
        Self {
            entries: Arc::new(IndexMap::new()),
        }
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for Pool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<C: RoutingKey> PartialEq for Pool<C> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries) || self.entries == other.entries
    }
}

impl<C: RoutingKey> Eq for Pool<C> {}

impl<C: RoutingKey> Pool<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, routing: &C) -> Option<&RoutingContext<C>> {
        self.entries.get(routing)
    }

    pub fn contains_key(&self, routing: &C) -> bool {
        self.entries.contains_key(routing)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &C> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&C, &RoutingContext<C>)> {
        self.entries.iter()
    }

    /// Returns a new pool with `entry` stored under `routing`.
    pub fn with_entry(&self, routing: C, entry: RoutingContext<C>) -> Self {
        let mut entries = Arc::clone(&self.entries);
        Arc::make_mut(&mut entries).insert(routing, entry);
        Self { entries }
    }

    /// Returns a new pool without `routing`, keeping the order of the rest.
    pub fn without(&self, routing: &C) -> Self {
        if !self.entries.contains_key(routing) {
            return self.clone();
        }
        let mut entries = Arc::clone(&self.entries);
        Arc::make_mut(&mut entries).shift_remove(routing);
        Self { entries }
    }

    pub fn to_mutable(&self) -> MutablePool<C> {
        MutablePool {
            entries: (*self.entries).clone(),
        }
    }
}

impl<C: RoutingKey> FromIterator<(C, RoutingContext<C>)> for Pool<C> {
    fn from_iter<I: IntoIterator<Item = (C, RoutingContext<C>)>>(iter: I) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().collect()),
        }
    }
}

/// Scratch pool, exclusive to one in-flight transaction.
#[derive(Debug, Clone)]
pub struct MutablePool<C> {
    entries: IndexMap<C, RoutingContext<C>>,
}

impl<C> Default for MutablePool<C> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<C: RoutingKey> MutablePool<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, routing: &C) -> Option<&RoutingContext<C>> {
        self.entries.get(routing)
    }

    pub fn contains_key(&self, routing: &C) -> bool {
        self.entries.contains_key(routing)
    }

    pub fn insert(&mut self, routing: C, entry: RoutingContext<C>) -> Option<RoutingContext<C>> {
        self.entries.insert(routing, entry)
    }

    pub fn remove(&mut self, routing: &C) -> Option<RoutingContext<C>> {
        self.entries.shift_remove(routing)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&C, &RoutingContext<C>)> {
        self.entries.iter()
    }

    pub fn freeze(self) -> Pool<C> {
        Pool {
            entries: Arc::new(self.entries),
        }
    }
}
