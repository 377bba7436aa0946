//! Tick source for animated transitions.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Runs a callback on a later tick.
///
/// Transitions post without holding their lock, so running the callback
/// inline does not deadlock. It does recurse while a driver stays unsettled,
/// so real schedulers should defer to the next frame.
pub trait Scheduler: Send + Sync {
    fn post(&self, callback: Callback) -> ScheduledCallback;
}

/// Handle to a posted callback. Cancelling guarantees it will not run if it
/// has not started yet.
#[derive(Debug, Clone, Default)]
pub struct ScheduledCallback {
    token: CancellationToken,
}

impl ScheduledCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Fires callbacks one frame later on the current tokio runtime.
#[derive(Debug, Clone, Copy)]
pub struct TokioScheduler {
    frame: Duration,
}

impl TokioScheduler {
    pub fn new(frame: Duration) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> Duration {
        self.frame
    }
}

impl Scheduler for TokioScheduler {
    fn post(&self, callback: Callback) -> ScheduledCallback {
        let scheduled = ScheduledCallback::new();
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "No tokio runtime, dropping scheduled callback");
                scheduled.cancel();
                return scheduled;
            }
        };

        let token = scheduled.token().clone();
        let frame = self.frame;
        handle.spawn(async move {
            if frame.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(frame) => {}
                }
            }
            if !token.is_cancelled() {
                callback();
            }
        });
        scheduled
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn fires_after_a_frame() {
        let scheduler = TokioScheduler::new(Duration::from_millis(1));
        let (tx, rx) = tokio::sync::oneshot::channel();

        scheduler.post(Box::new(move || {
            let _ = tx.send(());
        }));

        tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("callback did not fire")
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_callback_never_runs() {
        let scheduler = TokioScheduler::new(Duration::from_millis(5));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let scheduled = scheduler.post(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        scheduled.cancel();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(scheduled.is_cancelled());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn outside_runtime_is_cancelled() {
        let scheduler = TokioScheduler::new(Duration::ZERO);
        let scheduled = scheduler.post(Box::new(|| {}));
        assert!(scheduled.is_cancelled());
    }
}
