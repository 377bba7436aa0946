//! The state owned by a configuration feature and folded by the reducer.

use std::collections::HashSet;

use super::{ActivationState, Pool, RoutingKey};
use crate::transition::{OngoingTransition, TransitionId};

#[derive(Debug, Clone)]
pub struct WorkingState<C> {
    /// Pool-wide level. `Sleeping` means every command applies synchronously.
    pub activation_level: ActivationState,
    pub pool: Pool<C>,
    /// Keys animating out towards `Inactive`.
    pub pending_deactivate: HashSet<C>,
    /// Keys animating out and scheduled for removal.
    pub pending_removal: HashSet<C>,
    /// In-flight transitions, in registration order.
    pub ongoing_transitions: Vec<OngoingTransition<C>>,
}

impl<C> Default for WorkingState<C> {
    fn default() -> Self {
        Self {
            activation_level: ActivationState::Active,
            pool: Pool::default(),
            pending_deactivate: HashSet::new(),
            pending_removal: HashSet::new(),
            ongoing_transitions: Vec::new(),
        }
    }
}

impl<C: RoutingKey> WorkingState<C> {
    pub fn new(activation_level: ActivationState) -> Self {
        Self {
            activation_level,
            ..Self::default()
        }
    }

    pub fn is_animating(&self) -> bool {
        !self.ongoing_transitions.is_empty()
    }

    pub fn ongoing_transition(&self, id: TransitionId) -> Option<&OngoingTransition<C>> {
        self.ongoing_transitions.iter().find(|t| t.id() == id)
    }

    /// Diagnostic view of the state, with keys rendered through `Debug`.
    pub fn summary(&self) -> serde_json::Value {
        let pool: Vec<serde_json::Value> = self
            .pool
            .iter()
            .map(|(routing, entry)| {
                serde_json::json!({
                    "routing": format!("{:?}", routing),
                    "activation_state": entry.activation_state(),
                    "resolved": entry.is_resolved(),
                })
            })
            .collect();

        let sorted = |set: &HashSet<C>| {
            let mut keys: Vec<String> = set.iter().map(|k| format!("{:?}", k)).collect();
            keys.sort();
            keys
        };

        serde_json::json!({
            "activation_level": self.activation_level,
            "pool": pool,
            "pending_deactivate": sorted(&self.pending_deactivate),
            "pending_removal": sorted(&self.pending_removal),
            "ongoing_transitions": self.ongoing_transitions.len(),
        })
    }
}
