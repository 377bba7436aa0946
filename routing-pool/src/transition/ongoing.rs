//! In-flight transition handle.
//!
//! An [`OngoingTransition`] owns the actions of one animated transaction. It
//! goes Pending (waiting for its first tick) → Running (drivers started) →
//! Finished. `reverse()` and `jump_to_end()` are accepted in every phase and
//! finishing happens exactly once.
//!
//! Action hooks, the transition handler and entering views run while the
//! transition is locked and must not call back into the same handle. The
//! scheduler is never called with the lock held.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{TransitionDirection, TransitionElement, TransitionHandler, TransitionPair};
use crate::action::{Action, ConfigurationAction, ReversibleAction};
use crate::feature::{EffectEmitter, TransitionEffect};
use crate::scheduler::{ScheduledCallback, Scheduler};
use crate::state::RoutingKey;
use crate::transaction::TransitionDescriptor;

/// Unique identifier for an ongoing transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionId(uuid::Uuid);

impl TransitionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for TransitionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Running,
    Finished,
}

struct Inner<C> {
    phase: Phase,
    descriptor: TransitionDescriptor<C>,
    direction: TransitionDirection,
    pair: TransitionPair,
    actions: Vec<ConfigurationAction<C>>,
    elements: Vec<TransitionElement<C>>,
    emitter: EffectEmitter<C>,
    handler: Arc<dyn TransitionHandler<C>>,
    scheduler: Arc<dyn Scheduler>,
    scheduled: Option<ScheduledCallback>,
    reversed: bool,
}

impl<C> Inner<C> {
    fn cancel_scheduled(&mut self) {
        if let Some(scheduled) = self.scheduled.take() {
            scheduled.cancel();
        }
    }

    fn set_entering_visible(&self, visible: bool) {
        for element in &self.elements {
            if element.direction == TransitionDirection::Enter {
                element.view.set_visible(visible);
            }
        }
    }
}

pub struct OngoingTransition<C> {
    id: TransitionId,
    inner: Arc<Mutex<Inner<C>>>,
}

impl<C> Clone for OngoingTransition<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> PartialEq for OngoingTransition<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C> Eq for OngoingTransition<C> {}

impl<C: std::fmt::Debug> std::fmt::Debug for OngoingTransition<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("OngoingTransition");
        s.field("id", &self.id);
        match self.inner.try_lock() {
            Ok(inner) => s
                .field("phase", &inner.phase)
                .field("descriptor", &inner.descriptor)
                .field("direction", &inner.direction)
                .finish(),
            Err(_) => s.finish_non_exhaustive(),
        }
    }
}

impl<C: RoutingKey> OngoingTransition<C> {
    /// Hide the entering views, register the transition through the emitter
    /// and schedule its start on the next tick.
    pub fn begin(
        descriptor: TransitionDescriptor<C>,
        actions: Vec<ConfigurationAction<C>>,
        elements: Vec<TransitionElement<C>>,
        emitter: EffectEmitter<C>,
        handler: Arc<dyn TransitionHandler<C>>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let inner = Inner {
            phase: Phase::Pending,
            descriptor,
            direction: TransitionDirection::Exit,
            pair: TransitionPair::empty(),
            actions,
            elements,
            emitter: emitter.clone(),
            handler,
            scheduler: Arc::clone(&scheduler),
            scheduled: None,
            reversed: false,
        };
        inner.set_entering_visible(false);

        let transition = Self {
            id: TransitionId::new(),
            inner: Arc::new(Mutex::new(inner)),
        };
        tracing::info!(
            transition = %transition.id,
            transaction = %emitter.transaction(),
            "Transition started"
        );
        emitter.emit(TransitionEffect::Started(transition.clone()));

        let handle = transition.clone();
        let scheduled = scheduler.post(Box::new(move || handle.start()));
        let mut inner = transition.lock();
        if inner.phase == Phase::Pending {
            inner.scheduled = Some(scheduled);
        } else {
            scheduled.cancel();
        }
        drop(inner);
        transition
    }

    pub fn id(&self) -> TransitionId {
        self.id
    }

    /// Where the transition currently goes; flips on every reversal.
    pub fn descriptor(&self) -> TransitionDescriptor<C> {
        self.lock().descriptor.clone()
    }

    pub fn direction(&self) -> TransitionDirection {
        self.lock().direction
    }

    pub fn is_reversed(&self) -> bool {
        self.lock().reversed
    }

    pub fn is_pending(&self) -> bool {
        self.lock().phase == Phase::Pending
    }

    pub fn is_running(&self) -> bool {
        self.lock().phase == Phase::Running
    }

    pub fn is_finished(&self) -> bool {
        self.lock().phase == Phase::Finished
    }

    fn lock(&self) -> MutexGuard<'_, Inner<C>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!(transition = %self.id, "Ongoing transition mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn start(&self) {
        let mut inner = self.lock();
        if inner.phase != Phase::Pending {
            return;
        }
        inner.scheduled = None;
        inner.phase = Phase::Running;

        let pair = inner.handler.on_transition(&inner.elements);
        inner.set_entering_visible(true);
        for action in &mut inner.actions {
            action.on_transition();
        }
        pair.start();
        inner.pair = pair;
        tracing::debug!(transition = %self.id, "Transition running");

        let settled = self.settle(&mut inner);
        drop(inner);
        if !settled {
            self.schedule_check();
        }
    }

    fn check(&self) {
        let mut inner = self.lock();
        if inner.phase != Phase::Running {
            return;
        }
        inner.scheduled = None;
        let settled = self.settle(&mut inner);
        drop(inner);
        if !settled {
            self.schedule_check();
        }
    }

    /// Finish if both drivers settled.
    fn settle(&self, inner: &mut Inner<C>) -> bool {
        if !inner.pair.is_finished() {
            return false;
        }
        self.finish(inner);
        true
    }

    fn schedule_check(&self) {
        let scheduler = Arc::clone(&self.lock().scheduler);
        let handle = self.clone();
        let scheduled = scheduler.post(Box::new(move || handle.check()));

        let mut inner = self.lock();
        if inner.phase == Phase::Running {
            if let Some(previous) = inner.scheduled.replace(scheduled) {
                previous.cancel();
            }
        } else {
            scheduled.cancel();
        }
    }

    /// Undo the transition. Pending transitions finish right away; running
    /// ones play their drivers backwards. Returns `false` once finished.
    pub fn reverse(&self) -> bool {
        let mut inner = self.lock();
        self.reverse_locked(&mut inner)
    }

    /// Reverse only if `descriptor` leads back to where the transition
    /// started. Checked and applied under one lock, so a transition that
    /// finishes concurrently is never reported as reversed.
    pub fn reverse_if_undone_by(&self, descriptor: &TransitionDescriptor<C>) -> bool {
        let mut inner = self.lock();
        if !descriptor.is_reverse_of(&inner.descriptor) {
            return false;
        }
        self.reverse_locked(&mut inner)
    }

    fn reverse_locked(&self, inner: &mut Inner<C>) -> bool {
        let phase = inner.phase;
        match phase {
            Phase::Finished => return false,
            Phase::Pending => {
                inner.cancel_scheduled();
                inner.set_entering_visible(true);
                self.flip(inner);
                self.finish(inner);
            }
            Phase::Running => {
                self.flip(inner);
                inner.pair.reverse();
                inner.direction = inner.direction.reverse();
                tracing::info!(transition = %self.id, reversed = inner.reversed, "Transition reversed");
            }
        }
        true
    }

    fn flip(&self, inner: &mut Inner<C>) {
        for action in &mut inner.actions {
            action.reverse();
        }
        inner.reversed = !inner.reversed;
        inner.descriptor = inner.descriptor.reversed();
    }

    /// Fast-forward to the final state without waiting for the drivers.
    /// Returns `false` if it had already finished.
    pub fn jump_to_end(&self) -> bool {
        let mut inner = self.lock();
        self.jump_to_end_locked(&mut inner)
    }

    /// Jump to the end only if `descriptor` starts where the transition
    /// ends. Checked and applied under one lock.
    pub fn jump_to_end_if_continued_by(&self, descriptor: &TransitionDescriptor<C>) -> bool {
        let mut inner = self.lock();
        if !descriptor.is_continuation_of(&inner.descriptor) {
            return false;
        }
        self.jump_to_end_locked(&mut inner)
    }

    fn jump_to_end_locked(&self, inner: &mut Inner<C>) -> bool {
        let phase = inner.phase;
        match phase {
            Phase::Finished => return false,
            Phase::Pending => {
                inner.cancel_scheduled();
                inner.set_entering_visible(true);
                for action in &mut inner.actions {
                    action.on_transition();
                }
                self.finish(inner);
            }
            Phase::Running => {
                inner.pair.end();
                self.finish(inner);
            }
        }
        true
    }

    fn finish(&self, inner: &mut Inner<C>) {
        inner.cancel_scheduled();
        inner.phase = Phase::Finished;
        if inner.reversed {
            // Undo the batch last-in first-out.
            for action in inner.actions.iter_mut().rev() {
                action.on_finish();
            }
        } else {
            for action in &mut inner.actions {
                action.on_finish();
            }
        }
        inner.emitter.emit(TransitionEffect::Finished(self.id));
        inner.emitter.complete();
        tracing::info!(
            transition = %self.id,
            transaction = %inner.emitter.transaction(),
            reversed = inner.reversed,
            "Transition finished"
        );
    }
}
