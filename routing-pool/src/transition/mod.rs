//! Transition contract: elements handed to a handler, the drivers it returns,
//! and the in-flight transition that ties them to a batch of actions.

mod handler;
mod ongoing;
mod timeline;

use std::sync::Arc;

pub use handler::{Multiple, Noop, SharedElements, TransitionHandler};
pub use ongoing::{OngoingTransition, TransitionId};
pub use timeline::{Timeline, TimelineHandler};

use crate::state::ViewHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDirection {
    Enter,
    Exit,
}

impl TransitionDirection {
    pub fn reverse(self) -> Self {
        match self {
            Self::Enter => Self::Exit,
            Self::Exit => Self::Enter,
        }
    }
}

#[derive(Clone)]
pub struct TransitionElement<C> {
    pub routing: C,
    pub direction: TransitionDirection,
    /// The key enters or leaves the pool in the same batch.
    pub added_or_removed: bool,
    pub view: ViewHandle,
}

impl<C: std::fmt::Debug> std::fmt::Debug for TransitionElement<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionElement")
            .field("routing", &self.routing)
            .field("direction", &self.direction)
            .field("added_or_removed", &self.added_or_removed)
            .finish_non_exhaustive()
    }
}

/// A driver returned by a [`TransitionHandler`].
pub trait Transition: Send + Sync {
    fn start(&self);

    /// Jump to the final frame.
    fn end(&self);

    fn reverse(&self);

    fn is_finished(&self) -> bool;
}

/// Runs several drivers as one. Settles when all of them have.
pub struct MultipleTransition {
    transitions: Vec<Arc<dyn Transition>>,
}

impl MultipleTransition {
    pub fn new(transitions: Vec<Arc<dyn Transition>>) -> Self {
        Self { transitions }
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

impl Transition for MultipleTransition {
    fn start(&self) {
        self.transitions.iter().for_each(|t| t.start());
    }

    fn end(&self) {
        self.transitions.iter().for_each(|t| t.end());
    }

    fn reverse(&self) {
        self.transitions.iter().for_each(|t| t.reverse());
    }

    fn is_finished(&self) -> bool {
        self.transitions.iter().all(|t| t.is_finished())
    }
}

/// Exiting and entering drivers of one transition. A missing side counts as settled.
#[derive(Clone, Default)]
pub struct TransitionPair {
    pub exiting: Option<Arc<dyn Transition>>,
    pub entering: Option<Arc<dyn Transition>>,
}

impl TransitionPair {
    pub fn new(exiting: Option<Arc<dyn Transition>>, entering: Option<Arc<dyn Transition>>) -> Self {
        Self { exiting, entering }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    fn each(&self, f: impl Fn(&dyn Transition)) {
        for transition in [&self.exiting, &self.entering].into_iter().flatten() {
            f(&**transition);
        }
    }

    pub fn start(&self) {
        self.each(|t| t.start());
    }

    pub fn end(&self) {
        self.each(|t| t.end());
    }

    pub fn reverse(&self) {
        self.each(|t| t.reverse());
    }

    pub fn is_finished(&self) -> bool {
        [&self.exiting, &self.entering]
            .into_iter()
            .flatten()
            .all(|t| t.is_finished())
    }
}

impl std::fmt::Debug for TransitionPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionPair")
            .field("exiting", &self.exiting.is_some())
            .field("entering", &self.entering.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ManualTransition;

    #[test]
    fn empty_pair_is_settled() {
        assert!(TransitionPair::empty().is_finished());
        assert!(MultipleTransition::new(Vec::new()).is_finished());
    }

    #[test]
    fn pair_waits_for_both_sides() {
        let exiting = Arc::new(ManualTransition::default());
        let entering = Arc::new(ManualTransition::default());
        let pair = TransitionPair::new(
            Some(exiting.clone() as Arc<dyn Transition>),
            Some(entering.clone() as Arc<dyn Transition>),
        );

        pair.start();
        assert!(exiting.started() && entering.started());
        assert!(!pair.is_finished());

        exiting.settle();
        assert!(!pair.is_finished());

        pair.end();
        assert!(pair.is_finished());
    }

    #[test]
    fn multiple_forwards_reverse() {
        let a = Arc::new(ManualTransition::default());
        let b = Arc::new(ManualTransition::default());
        let transitions: Vec<Arc<dyn Transition>> = vec![a.clone(), b.clone()];
        let multiple = MultipleTransition::new(transitions);

        multiple.reverse();

        assert_eq!(a.reversals(), 1);
        assert_eq!(b.reversals(), 1);
        assert_eq!(multiple.len(), 2);
    }

    #[test]
    fn direction_reverses() {
        assert_eq!(TransitionDirection::Enter.reverse(), TransitionDirection::Exit);
        assert_eq!(TransitionDirection::Exit.reverse(), TransitionDirection::Enter);
    }
}
