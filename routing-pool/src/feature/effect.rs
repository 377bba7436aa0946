//! Effects emitted by actions and ongoing transitions, and the per-transaction
//! emitter that carries them back to the feature loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::state::RoutingContext;
use crate::transition::{OngoingTransition, TransitionId};

/// Monotonic id of a transaction within one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalEffect {
    Sleep,
    WakeUp,
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum IndividualEffect<C> {
    Added { routing: C, entry: RoutingContext<C> },
    Removed { routing: C },
    Activated { routing: C, entry: RoutingContext<C> },
    Deactivated { routing: C, entry: RoutingContext<C> },
    PendingDeactivate { routing: C, pending: bool },
    PendingRemoval { routing: C, pending: bool },
}

impl<C> IndividualEffect<C> {
    pub fn routing(&self) -> &C {
        match self {
            Self::Added { routing, .. }
            | Self::Removed { routing }
            | Self::Activated { routing, .. }
            | Self::Deactivated { routing, .. }
            | Self::PendingDeactivate { routing, .. }
            | Self::PendingRemoval { routing, .. } => routing,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TransitionEffect<C> {
    Started(OngoingTransition<C>),
    Finished(TransitionId),
}

#[derive(Debug, Clone)]
pub enum Effect<C> {
    Global(GlobalEffect),
    Individual(IndividualEffect<C>),
    Transition(TransitionEffect<C>),
}

impl<C> From<GlobalEffect> for Effect<C> {
    fn from(effect: GlobalEffect) -> Self {
        Effect::Global(effect)
    }
}

impl<C> From<IndividualEffect<C>> for Effect<C> {
    fn from(effect: IndividualEffect<C>) -> Self {
        Effect::Individual(effect)
    }
}

impl<C> From<TransitionEffect<C>> for Effect<C> {
    fn from(effect: TransitionEffect<C>) -> Self {
        Effect::Transition(effect)
    }
}

/// What travels on the effect channel.
#[derive(Debug)]
pub enum Envelope<C> {
    Effect(TransactionId, Effect<C>),
    Complete(TransactionId),
}

/// Ordered sink for one transaction's effects.
///
/// Clones share the completion flag: once any clone calls [`complete`](Self::complete),
/// later effects are dropped with a warning.
pub struct EffectEmitter<C> {
    transaction: TransactionId,
    tx: mpsc::UnboundedSender<Envelope<C>>,
    completed: Arc<AtomicBool>,
}

impl<C> Clone for EffectEmitter<C> {
    fn clone(&self) -> Self {
        Self {
            transaction: self.transaction,
            tx: self.tx.clone(),
            completed: Arc::clone(&self.completed),
        }
    }
}

impl<C: std::fmt::Debug> EffectEmitter<C> {
    pub fn new(transaction: TransactionId, tx: mpsc::UnboundedSender<Envelope<C>>) -> Self {
        Self {
            transaction,
            tx,
            completed: Arc::new(AtomicBool::new(false)),
        }
    }

    #[cfg(test)]
    pub(crate) fn channel(
        transaction: TransactionId,
    ) -> (Self, mpsc::UnboundedReceiver<Envelope<C>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(transaction, tx), rx)
    }

    pub fn transaction(&self) -> TransactionId {
        self.transaction
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn emit(&self, effect: impl Into<Effect<C>>) {
        let effect = effect.into();
        if self.is_completed() {
            tracing::warn!(transaction = %self.transaction, ?effect, "Dropping effect emitted after completion");
            return;
        }
        if self.tx.send(Envelope::Effect(self.transaction, effect)).is_err() {
            tracing::debug!(transaction = %self.transaction, "Effect channel closed");
        }
    }

    /// Signals that every effect of the transaction has been emitted. Idempotent.
    pub fn complete(&self) {
        if self.completed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.tx.send(Envelope::Complete(self.transaction)).is_err() {
            tracing::debug!(transaction = %self.transaction, "Effect channel closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<Envelope<&'static str>>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            out.push(match envelope {
                Envelope::Effect(_, Effect::Individual(e)) => format!("effect:{}", e.routing()),
                Envelope::Effect(_, other) => format!("effect:{:?}", other),
                Envelope::Complete(id) => format!("complete:{}", id),
            });
        }
        out
    }

    #[test]
    fn effects_keep_emission_order() {
        let (emitter, mut rx) = EffectEmitter::channel(TransactionId::new(7));

        emitter.emit(IndividualEffect::Removed { routing: "a" });
        emitter.emit(IndividualEffect::Removed { routing: "b" });
        emitter.complete();

        assert_eq!(drain(&mut rx), vec!["effect:a", "effect:b", "complete:tx-7"]);
    }

    #[test]
    fn complete_is_sent_once_and_seals_the_emitter() {
        let (emitter, mut rx) = EffectEmitter::channel(TransactionId::new(1));
        let clone = emitter.clone();

        emitter.complete();
        clone.complete();
        clone.emit(GlobalEffect::Sleep);

        assert!(clone.is_completed());
        assert_eq!(drain(&mut rx), vec!["complete:tx-1"]);
    }

    #[test]
    fn closed_channel_is_tolerated() {
        let (emitter, rx) = EffectEmitter::<&str>::channel(TransactionId::new(1));
        drop(rx);

        emitter.emit(GlobalEffect::Shutdown);
        emitter.complete();
    }
}
