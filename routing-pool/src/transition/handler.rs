use std::sync::Arc;

use super::{MultipleTransition, Transition, TransitionElement, TransitionPair};

/// Computes the drivers animating a set of elements. Rendering is entirely
/// up to the implementor.
pub trait TransitionHandler<C>: Send + Sync {
    fn on_transition(&self, elements: &[TransitionElement<C>]) -> TransitionPair;

    /// Shared-element handlers must run before any other handler.
    fn is_shared_elements(&self) -> bool {
        false
    }
}

/// Marks a handler as a shared-element handler.
pub struct SharedElements<C> {
    inner: Arc<dyn TransitionHandler<C>>,
}

impl<C> SharedElements<C> {
    pub fn new(inner: Arc<dyn TransitionHandler<C>>) -> Self {
        Self { inner }
    }
}

impl<C> TransitionHandler<C> for SharedElements<C> {
    fn on_transition(&self, elements: &[TransitionElement<C>]) -> TransitionPair {
        self.inner.on_transition(elements)
    }

    fn is_shared_elements(&self) -> bool {
        true
    }
}

/// Composite handler. Every sub-handler sees the full element list; their
/// drivers are merged per side.
pub struct Multiple<C> {
    handlers: Vec<Arc<dyn TransitionHandler<C>>>,
}

impl<C> Multiple<C> {
    pub fn new(mut handlers: Vec<Arc<dyn TransitionHandler<C>>>) -> Self {
        // Only the first shared-element handler moves; the rest keep their order.
        if let Some(idx) = handlers.iter().position(|h| h.is_shared_elements())
            && idx > 0
        {
            let shared = handlers.remove(idx);
            handlers.insert(0, shared);
        }
        Self { handlers }
    }

    pub fn handlers(&self) -> &[Arc<dyn TransitionHandler<C>>] {
        &self.handlers
    }
}

impl<C> TransitionHandler<C> for Multiple<C> {
    fn on_transition(&self, elements: &[TransitionElement<C>]) -> TransitionPair {
        let mut exiting: Vec<Arc<dyn Transition>> = Vec::new();
        let mut entering: Vec<Arc<dyn Transition>> = Vec::new();
        for handler in &self.handlers {
            let pair = handler.on_transition(elements);
            exiting.extend(pair.exiting);
            entering.extend(pair.entering);
        }

        let merge = |transitions: Vec<Arc<dyn Transition>>| -> Option<Arc<dyn Transition>> {
            if transitions.is_empty() {
                None
            } else {
                Some(Arc::new(MultipleTransition::new(transitions)))
            }
        };
        TransitionPair::new(merge(exiting), merge(entering))
    }
}

/// Handler that animates nothing; transitions settle on their first tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

impl<C> TransitionHandler<C> for Noop {
    fn on_transition(&self, _elements: &[TransitionElement<C>]) -> TransitionPair {
        TransitionPair::empty()
    }
}
