//! Duration-based driver clocked by the tokio clock.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use super::{Transition, TransitionDirection, TransitionElement, TransitionHandler, TransitionPair};

#[derive(Debug)]
struct TimelineState {
    /// Progress at `anchor`, in `[0, 1]`.
    origin: f64,
    anchor: Option<Instant>,
    forward: bool,
}

/// Runs from 0 to 1 over `duration`. Reversing runs back from wherever it is.
#[derive(Debug)]
pub struct Timeline {
    duration: Duration,
    state: Mutex<TimelineState>,
}

impl Timeline {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            state: Mutex::new(TimelineState {
                origin: 0.0,
                anchor: None,
                forward: true,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, TimelineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn progress_of(&self, state: &TimelineState) -> f64 {
        let target = if state.forward { 1.0 } else { 0.0 };
        let Some(anchor) = state.anchor else {
            return state.origin;
        };
        if self.duration.is_zero() {
            return target;
        }
        let delta = anchor.elapsed().as_secs_f64() / self.duration.as_secs_f64();
        let progress = if state.forward {
            state.origin + delta
        } else {
            state.origin - delta
        };
        progress.clamp(0.0, 1.0)
    }

    pub fn progress(&self) -> f64 {
        let state = self.state();
        self.progress_of(&state)
    }

    pub fn is_forward(&self) -> bool {
        self.state().forward
    }
}

impl Transition for Timeline {
    fn start(&self) {
        let mut state = self.state();
        if state.anchor.is_none() {
            state.anchor = Some(Instant::now());
        }
    }

    fn end(&self) {
        let mut state = self.state();
        state.origin = if state.forward { 1.0 } else { 0.0 };
        state.anchor = None;
    }

    fn reverse(&self) {
        let mut state = self.state();
        state.origin = self.progress_of(&state);
        if state.anchor.is_some() {
            state.anchor = Some(Instant::now());
        }
        state.forward = !state.forward;
    }

    fn is_finished(&self) -> bool {
        let state = self.state();
        let target = if state.forward { 1.0 } else { 0.0 };
        self.progress_of(&state) == target
    }
}

/// Gives each side that has elements its own [`Timeline`].
#[derive(Debug, Clone, Copy)]
pub struct TimelineHandler {
    duration: Duration,
}

impl TimelineHandler {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<C> TransitionHandler<C> for TimelineHandler {
    fn on_transition(&self, elements: &[TransitionElement<C>]) -> TransitionPair {
        let timeline_for = |direction: TransitionDirection| -> Option<Arc<dyn Transition>> {
            elements
                .iter()
                .any(|e| e.direction == direction)
                .then(|| Arc::new(Timeline::new(self.duration)) as Arc<dyn Transition>)
        };
        TransitionPair::new(
            timeline_for(TransitionDirection::Exit),
            timeline_for(TransitionDirection::Enter),
        )
    }
}
