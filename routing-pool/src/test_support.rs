//! Test doubles for the collaborators of a configuration feature.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::feature::{Effect, Envelope, IndividualEffect, TransitionEffect};
use crate::resolver::{RoutingActivator, RoutingResolver};
use crate::scheduler::{Callback, ScheduledCallback, Scheduler};
use crate::state::{Node, ParentContext, View, ViewHandle};
use crate::transition::{Transition, TransitionElement, TransitionHandler, TransitionPair};

/// Records every visibility change.
#[derive(Default)]
pub struct TestView {
    visibility: Mutex<Vec<bool>>,
}

impl TestView {
    pub fn visibility(&self) -> Vec<bool> {
        self.visibility.lock().unwrap().clone()
    }
}

impl View for TestView {
    fn set_visible(&self, visible: bool) {
        self.visibility.lock().unwrap().push(visible);
    }
}

/// Resolves every key to a fresh node with its own [`TestView`].
#[derive(Default)]
pub struct TestResolver {
    resolutions: Mutex<HashMap<&'static str, usize>>,
    views: Mutex<HashMap<&'static str, Arc<TestView>>>,
}

impl TestResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolutions(&self, routing: &str) -> usize {
        self.resolutions.lock().unwrap().get(routing).copied().unwrap_or(0)
    }

    /// View of the node most recently resolved for `routing`.
    pub fn view_of(&self, routing: &str) -> Arc<TestView> {
        self.views.lock().unwrap()[routing].clone()
    }
}

impl RoutingResolver<&'static str> for TestResolver {
    fn resolve(&self, routing: &&'static str, parent: &ParentContext) -> Node {
        *self.resolutions.lock().unwrap().entry(*routing).or_default() += 1;
        let view = Arc::new(TestView::default());
        self.views.lock().unwrap().insert(*routing, view.clone());
        let handle: ViewHandle = view;
        Node::new(parent, Some(handle))
    }
}

/// Logs activator calls as `"<call>:<key>"`.
#[derive(Default)]
pub struct RecordingActivator {
    events: Mutex<Vec<String>>,
}

impl RecordingActivator {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, call: &str, routing: &str) {
        self.events.lock().unwrap().push(format!("{}:{}", call, routing));
    }
}

impl RoutingActivator<&'static str> for RecordingActivator {
    fn activate(&self, routing: &&'static str, _node: &Node) {
        self.record("activate", routing);
    }

    fn deactivate(&self, routing: &&'static str, _node: &Node) {
        self.record("deactivate", routing);
    }

    fn destroy(&self, routing: &&'static str, _node: &Node) {
        self.record("destroy", routing);
    }
}

/// Drains an effect channel into short, comparable strings.
pub fn effect_log(rx: &mut mpsc::UnboundedReceiver<Envelope<&'static str>>) -> Vec<String> {
    let mut log = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        let line = match envelope {
            Envelope::Complete(_) => "complete".to_string(),
            Envelope::Effect(_, Effect::Global(global)) => format!("global:{:?}", global),
            Envelope::Effect(_, Effect::Transition(TransitionEffect::Started(_))) => "started".to_string(),
            Envelope::Effect(_, Effect::Transition(TransitionEffect::Finished(_))) => "finished".to_string(),
            Envelope::Effect(_, Effect::Individual(effect)) => match effect {
                IndividualEffect::Added { routing, entry } => {
                    format!("added:{}={}", routing, entry.activation_state())
                }
                IndividualEffect::Removed { routing } => format!("removed:{}", routing),
                IndividualEffect::Activated { routing, entry } => {
                    format!("activated:{}={}", routing, entry.activation_state())
                }
                IndividualEffect::Deactivated { routing, entry } => {
                    format!("deactivated:{}={}", routing, entry.activation_state())
                }
                IndividualEffect::PendingDeactivate { routing, pending } => {
                    format!("pending_deactivate:{}={}", routing, pending)
                }
                IndividualEffect::PendingRemoval { routing, pending } => {
                    format!("pending_removal:{}={}", routing, pending)
                }
            },
        };
        log.push(line);
    }
    log
}

/// Scheduler that only fires when the test says so.
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<Vec<(ScheduledCallback, Callback)>>,
}

impl ManualScheduler {
    /// Run every callback queued before this call. Callbacks they post wait
    /// for the next tick.
    pub fn tick(&self) {
        let due = std::mem::take(&mut *self.queue.lock().unwrap());
        for (scheduled, callback) in due {
            if !scheduled.is_cancelled() {
                callback();
            }
        }
    }

    /// Callbacks queued and not cancelled.
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap()
            .iter()
            .filter(|(scheduled, _)| !scheduled.is_cancelled())
            .count()
    }
}

impl Scheduler for ManualScheduler {
    fn post(&self, callback: Callback) -> ScheduledCallback {
        let scheduled = ScheduledCallback::new();
        self.queue.lock().unwrap().push((scheduled.clone(), callback));
        scheduled
    }
}

/// Driver that settles only when told to.
#[derive(Default)]
pub struct ManualTransition {
    started: AtomicBool,
    ended: AtomicBool,
    settled: AtomicBool,
    reversals: AtomicUsize,
}

impl ManualTransition {
    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    pub fn reversals(&self) -> usize {
        self.reversals.load(Ordering::SeqCst)
    }

    pub fn settle(&self) {
        self.settled.store(true, Ordering::SeqCst);
    }
}

impl Transition for ManualTransition {
    fn start(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    fn end(&self) {
        self.ended.store(true, Ordering::SeqCst);
        self.settle();
    }

    fn reverse(&self) {
        self.reversals.fetch_add(1, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        self.settled.load(Ordering::SeqCst)
    }
}

/// Handler writing its name to a shared log on every call.
pub struct RecordingHandler {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingHandler {
    pub fn shared_log() -> Arc<Mutex<Vec<&'static str>>> {
        Arc::default()
    }

    pub fn new(name: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Self {
        Self { name, log }
    }
}

impl<C> TransitionHandler<C> for RecordingHandler {
    fn on_transition(&self, _elements: &[TransitionElement<C>]) -> TransitionPair {
        self.log.lock().unwrap().push(self.name);
        TransitionPair::empty()
    }
}

/// Handler that drives every transition with `driver` as its exiting side.
pub fn handler_with(driver: Arc<ManualTransition>) -> Arc<dyn TransitionHandler<&'static str>> {
    struct Fixed(Arc<ManualTransition>);

    impl TransitionHandler<&'static str> for Fixed {
        fn on_transition(&self, _elements: &[TransitionElement<&'static str>]) -> TransitionPair {
            let exiting: Arc<dyn Transition> = self.0.clone();
            TransitionPair::new(Some(exiting), None)
        }
    }

    Arc::new(Fixed(driver))
}
