//! Pure fold of effects into the next working state.

use super::{Effect, GlobalEffect, IndividualEffect, TransitionEffect};
use crate::state::{ActivationState, Pool, RoutingKey, WorkingState};

pub fn reduce<C: RoutingKey>(mut state: WorkingState<C>, effect: Effect<C>) -> WorkingState<C> {
    match effect {
        Effect::Global(effect) => reduce_global(&mut state, effect),
        Effect::Individual(effect) => reduce_individual(&mut state, effect),
        Effect::Transition(TransitionEffect::Started(transition)) => {
            if !state.ongoing_transitions.contains(&transition) {
                state.ongoing_transitions.push(transition);
            }
        }
        Effect::Transition(TransitionEffect::Finished(id)) => {
            state.ongoing_transitions.retain(|t| t.id() != id);
        }
    }
    state
}

fn reduce_global<C: RoutingKey>(state: &mut WorkingState<C>, effect: GlobalEffect) {
    match effect {
        GlobalEffect::Sleep => {
            state.activation_level = ActivationState::Sleeping;
            state.pool = map_states(&state.pool, ActivationState::sleep);
        }
        GlobalEffect::WakeUp => {
            state.activation_level = ActivationState::Active;
            state.pool = map_states(&state.pool, ActivationState::wake_up);
        }
        GlobalEffect::Shutdown => {
            state.pool = Pool::new();
            state.pending_deactivate.clear();
            state.pending_removal.clear();
        }
    }
}

fn map_states<C: RoutingKey>(pool: &Pool<C>, f: fn(ActivationState) -> ActivationState) -> Pool<C> {
    pool.iter()
        .map(|(routing, entry)| {
            (
                routing.clone(),
                entry.with_activation_state(f(entry.activation_state())),
            )
        })
        .collect()
}

fn reduce_individual<C: RoutingKey>(state: &mut WorkingState<C>, effect: IndividualEffect<C>) {
    match effect {
        IndividualEffect::Added { routing, entry } => {
            if state.pool.contains_key(&routing) {
                tracing::warn!(routing = ?routing, "Ignoring add of a key already in the pool");
                return;
            }
            state.pool = state.pool.with_entry(routing, entry);
        }
        IndividualEffect::Removed { routing } => {
            state.pool = state.pool.without(&routing);
            state.pending_deactivate.remove(&routing);
            state.pending_removal.remove(&routing);
        }
        IndividualEffect::Activated { routing, entry } => upsert(state, routing, entry),
        IndividualEffect::Deactivated { routing, entry } => {
            state.pending_deactivate.remove(&routing);
            upsert(state, routing, entry);
        }
        IndividualEffect::PendingDeactivate { routing, pending } => {
            if pending {
                state.pending_deactivate.insert(routing);
            } else {
                state.pending_deactivate.remove(&routing);
            }
        }
        IndividualEffect::PendingRemoval { routing, pending } => {
            if pending {
                state.pending_removal.insert(routing);
            } else {
                state.pending_removal.remove(&routing);
            }
        }
    }
}

fn upsert<C: RoutingKey>(state: &mut WorkingState<C>, routing: C, entry: crate::state::RoutingContext<C>) {
    if !state.pool.contains_key(&routing) {
        tracing::warn!(routing = ?routing, "Ignoring update of a key not in the pool");
        return;
    }
    state.pool = state.pool.with_entry(routing, entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RoutingContext;

    fn entry(key: &'static str, state: ActivationState) -> RoutingContext<&'static str> {
        RoutingContext::unresolved(key, state)
    }

    fn added(key: &'static str) -> Effect<&'static str> {
        IndividualEffect::Added {
            routing: key,
            entry: entry(key, ActivationState::Inactive),
        }
        .into()
    }

    fn fold(effects: Vec<Effect<&'static str>>) -> WorkingState<&'static str> {
        effects.into_iter().fold(WorkingState::default(), reduce)
    }

    #[test]
    fn add_then_read() {
        let state = fold(vec![added("a")]);

        assert_eq!(
            state.pool.get(&"a").map(RoutingContext::activation_state),
            Some(ActivationState::Inactive)
        );
    }

    #[test]
    fn duplicate_add_keeps_existing_entry() {
        let state = fold(vec![
            added("a"),
            IndividualEffect::Activated {
                routing: "a",
                entry: entry("a", ActivationState::Active),
            }
            .into(),
            added("a"),
        ]);

        assert_eq!(state.pool.get(&"a").unwrap().activation_state(), ActivationState::Active);
    }

    #[test]
    fn update_of_unknown_key_is_ignored() {
        let state = fold(vec![IndividualEffect::Activated {
            routing: "ghost",
            entry: entry("ghost", ActivationState::Active),
        }
        .into()]);

        assert!(state.pool.is_empty());
    }

    #[test]
    fn removal_clears_pending_sets() {
        let state = fold(vec![
            added("a"),
            IndividualEffect::PendingDeactivate { routing: "a", pending: true }.into(),
            IndividualEffect::PendingRemoval { routing: "a", pending: true }.into(),
            IndividualEffect::Removed { routing: "a" }.into(),
        ]);

        assert!(state.pool.is_empty());
        assert!(state.pending_deactivate.is_empty());
        assert!(state.pending_removal.is_empty());
    }

    #[test]
    fn deactivated_clears_pending_deactivate() {
        let state = fold(vec![
            added("a"),
            IndividualEffect::PendingDeactivate { routing: "a", pending: true }.into(),
            IndividualEffect::Deactivated {
                routing: "a",
                entry: entry("a", ActivationState::Inactive),
            }
            .into(),
        ]);

        assert!(state.pending_deactivate.is_empty());
    }

    #[test]
    fn sleep_and_wake_up_map_every_entry() {
        let mut state = fold(vec![
            added("a"),
            IndividualEffect::Activated {
                routing: "a",
                entry: entry("a", ActivationState::Active),
            }
            .into(),
            added("b"),
        ]);

        state = reduce(state, GlobalEffect::Sleep.into());
        insta::assert_json_snapshot!(state.summary(), @r#"
        {
          "activation_level": "SLEEPING",
          "ongoing_transitions": 0,
          "pending_deactivate": [],
          "pending_removal": [],
          "pool": [
            {
              "activation_state": "SLEEPING",
              "resolved": false,
              "routing": "\"a\""
            },
            {
              "activation_state": "INACTIVE",
              "resolved": false,
              "routing": "\"b\""
            }
          ]
        }
        "#);

        state = reduce(state, GlobalEffect::WakeUp.into());
        assert_eq!(state.activation_level, ActivationState::Active);
        assert_eq!(state.pool.get(&"a").unwrap().activation_state(), ActivationState::Active);
    }

    #[test]
    fn shutdown_empties_pool_but_keeps_level() {
        let mut state = fold(vec![
            added("a"),
            IndividualEffect::PendingRemoval { routing: "a", pending: true }.into(),
        ]);
        state.activation_level = ActivationState::Sleeping;

        let state = reduce(state, GlobalEffect::Shutdown.into());

        assert!(state.pool.is_empty());
        assert!(state.pending_removal.is_empty());
        assert_eq!(state.activation_level, ActivationState::Sleeping);
    }
}
