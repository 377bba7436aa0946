//! Configuration feature runtime.
//!
//! One tokio task owns the [`WorkingState`]. Requests arrive over a bounded
//! channel and run in arrival order; effects arrive over an unbounded channel
//! and always win over new requests, so every transaction sees every effect
//! emitted before it. Each folded state is published on a watch channel.

mod actor;
mod effect;
mod reducer;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

pub use actor::{ConfigurationFeatureActor, NewTransitionsExecution, create_default_elements};
pub use effect::{
    Effect, EffectEmitter, Envelope, GlobalEffect, IndividualEffect, TransactionId,
    TransitionEffect,
};
pub use reducer::reduce;

use crate::config::FeatureConfig;
use crate::error::{CommandExecutionError, FeatureError};
use crate::resolver::{RoutingActivator, RoutingResolver};
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::state::{ParentContext, RoutingKey, WorkingState};
use crate::transaction::Transaction;

type ExecuteReply = oneshot::Sender<Result<PendingTransaction, CommandExecutionError>>;

enum Request<C> {
    Execute {
        transaction: Transaction<C>,
        /// `None` for fire-and-forget submissions.
        reply: Option<ExecuteReply>,
    },
    Snapshot {
        reply: oneshot::Sender<WorkingState<C>>,
    },
}

/// Handle to a submitted transaction.
#[derive(Debug)]
pub struct PendingTransaction {
    id: TransactionId,
    completion: oneshot::Receiver<()>,
}

impl PendingTransaction {
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Resolves once every effect of the transaction has been folded into
    /// the published state.
    pub async fn wait(self) -> Result<(), FeatureError> {
        self.completion.await.map_err(|_| FeatureError::Closed)
    }
}

/// Cloneable handle to a running feature. The feature stops once every
/// handle is dropped.
pub struct ConfigurationFeature<C> {
    requests: mpsc::Sender<Request<C>>,
    state: watch::Receiver<WorkingState<C>>,
}

impl<C> Clone for ConfigurationFeature<C> {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
            state: self.state.clone(),
        }
    }
}

impl<C: RoutingKey> ConfigurationFeature<C> {
    /// Start the feature loop on the current tokio runtime.
    pub fn spawn(
        resolver: Arc<dyn RoutingResolver<C>>,
        activator: Arc<dyn RoutingActivator<C>>,
        parent: ParentContext,
        config: FeatureConfig<C>,
    ) -> Self {
        let (request_tx, request_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (effect_tx, effect_rx) = mpsc::unbounded_channel();
        let initial = WorkingState::new(config.initial_activation_level);
        let (state_tx, state_rx) = watch::channel(initial.clone());

        let scheduler: Arc<dyn Scheduler> = match config.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::new(config.frame_interval)),
        };
        let actor = ConfigurationFeatureActor::new(
            resolver,
            activator,
            parent,
            config.transition_handler,
            scheduler,
        );

        tracing::info!(
            activation_level = %config.initial_activation_level,
            channel_capacity = config.channel_capacity,
            "Starting configuration feature"
        );
        let feature_loop = FeatureLoop {
            actor,
            state: initial,
            requests: request_rx,
            effects: effect_rx,
            effect_tx,
            state_tx,
            completions: HashMap::new(),
            next_transaction: 0,
        };
        tokio::spawn(feature_loop.run());

        Self {
            requests: request_tx,
            state: state_rx,
        }
    }

    /// Submit a transaction. Returns once its synchronous part has run.
    pub async fn execute(
        &self,
        transaction: impl Into<Transaction<C>>,
    ) -> Result<PendingTransaction, FeatureError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request::Execute {
                transaction: transaction.into(),
                reply: Some(reply),
            })
            .await
            .map_err(|_| FeatureError::Closed)?;
        let result = rx.await.map_err(|_| FeatureError::Closed)?;
        Ok(result?)
    }

    /// Submit a transaction without waiting. Failures are logged by the feature.
    pub async fn accept(&self, transaction: impl Into<Transaction<C>>) -> Result<(), FeatureError> {
        self.requests
            .send(Request::Execute {
                transaction: transaction.into(),
                reply: None,
            })
            .await
            .map_err(|_| FeatureError::Closed)
    }

    /// State after every request submitted before this call and every
    /// effect emitted so far have been processed.
    pub async fn snapshot(&self) -> Result<WorkingState<C>, FeatureError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(Request::Snapshot { reply })
            .await
            .map_err(|_| FeatureError::Closed)?;
        rx.await.map_err(|_| FeatureError::Closed)
    }

    /// Last published state.
    pub fn state(&self) -> WorkingState<C> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkingState<C>> {
        self.state.clone()
    }
}

struct FeatureLoop<C> {
    actor: ConfigurationFeatureActor<C>,
    state: WorkingState<C>,
    requests: mpsc::Receiver<Request<C>>,
    effects: mpsc::UnboundedReceiver<Envelope<C>>,
    effect_tx: mpsc::UnboundedSender<Envelope<C>>,
    state_tx: watch::Sender<WorkingState<C>>,
    completions: HashMap<TransactionId, oneshot::Sender<()>>,
    next_transaction: u64,
}

impl<C: RoutingKey> FeatureLoop<C> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                Some(envelope) = self.effects.recv() => {
                    self.handle_envelope(envelope);
                    self.drain_effects();
                    self.publish();
                }

                request = self.requests.recv() => {
                    let Some(request) = request else {
                        break;
                    };
                    self.handle_request(request);
                }
            }
        }
        tracing::debug!("Configuration feature stopped");
    }

    fn handle_request(&mut self, request: Request<C>) {
        self.drain_effects();
        match request {
            Request::Snapshot { reply } => {
                let _ = reply.send(self.state.clone());
            }
            Request::Execute { transaction, reply } => {
                let result = self.execute(transaction);
                self.drain_effects();
                self.publish();
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
        }
    }

    fn execute(
        &mut self,
        transaction: Transaction<C>,
    ) -> Result<PendingTransaction, CommandExecutionError> {
        self.next_transaction += 1;
        let id = TransactionId::new(self.next_transaction);

        let execution = self.actor.interrupt(&self.state, &transaction);
        self.drain_effects();

        let (completion_tx, completion) = oneshot::channel();
        if execution == NewTransitionsExecution::Abort {
            tracing::debug!(transaction = %id, "Transaction reversed an ongoing transition");
            let _ = completion_tx.send(());
            return Ok(PendingTransaction { id, completion });
        }

        let emitter = EffectEmitter::new(id, self.effect_tx.clone());
        self.completions.insert(id, completion_tx);
        if let Err(err) = self.actor.invoke(&self.state, transaction, emitter) {
            self.completions.remove(&id);
            tracing::error!(transaction = %id, error = %err, "Transaction failed");
            return Err(err);
        }
        Ok(PendingTransaction { id, completion })
    }

    fn drain_effects(&mut self) {
        while let Ok(envelope) = self.effects.try_recv() {
            self.handle_envelope(envelope);
        }
    }

    fn handle_envelope(&mut self, envelope: Envelope<C>) {
        match envelope {
            Envelope::Effect(id, effect) => {
                tracing::trace!(transaction = %id, ?effect, "Folding effect");
                let state = std::mem::take(&mut self.state);
                self.state = reduce(state, effect);
            }
            Envelope::Complete(id) => {
                if let Some(completion) = self.completions.remove(&id) {
                    self.publish();
                    let _ = completion.send(());
                }
            }
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
