//! FIFO single-flight request queue.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::time::Instant;

use super::ThrottleConfig;
use crate::error::ThrottleError;

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Serializes calls to a rate-limited provider.
///
/// Units of work run strictly in submission order, one at a time, and each
/// dispatch happens at least [`ThrottleConfig::window`] after the previous
/// one. A failing, panicking or timed-out unit only affects its own caller;
/// the queue keeps draining. A unit is never dropped once submitted, even if
/// its caller stops waiting.
///
/// Cheap to clone; clones share the same queue. The worker task stops once
/// every clone has been dropped and the queue is empty.
///
/// # Example
///
/// ```
/// use route_cache::error::ThrottleError;
/// use route_cache::throttle::{RequestThrottle, ThrottleConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let throttle = RequestThrottle::new(ThrottleConfig::default());
/// let answer = throttle
///     .enqueue(|| async { Ok::<_, ThrottleError>(42) })
///     .await;
/// assert_eq!(answer, Ok(42));
/// # }
/// ```
#[derive(Clone)]
pub struct RequestThrottle {
    sender: mpsc::UnboundedSender<Job>,
    shared: Arc<ThrottleShared>,
    config: ThrottleConfig,
}

struct ThrottleShared {
    queued: AtomicUsize,
    dispatched: AtomicU64,
}

impl RequestThrottle {
    /// Creates a throttle and spawns its worker task.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn new(config: ThrottleConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(ThrottleShared {
            queued: AtomicUsize::new(0),
            dispatched: AtomicU64::new(0),
        });

        tokio::spawn(drain(receiver, shared.clone(), config.window));

        Self {
            sender,
            shared,
            config,
        }
    }

    /// Submits a unit of work.
    ///
    /// The unit is queued immediately, before the returned future is first
    /// polled. The future resolves with the unit's own result, or with a
    /// [`ThrottleError`] converted into `E` if the unit timed out, panicked,
    /// or the queue is closed.
    pub fn enqueue<F, Fut, T, E>(
        &self,
        f: F,
    ) -> impl Future<Output = Result<T, E>> + Send + use<F, Fut, T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<ThrottleError> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel::<Result<Result<T, E>, ThrottleError>>();
        let call_timeout = self.config.call_timeout;

        let job: Job = Box::new(move || {
            async move {
                let call = AssertUnwindSafe(async move { f().await }).catch_unwind();
                let outcome = match call_timeout {
                    Some(limit) => match tokio::time::timeout(limit, call).await {
                        Ok(Ok(result)) => Ok(result),
                        Ok(Err(_)) => Err(ThrottleError::Panicked),
                        Err(_) => Err(ThrottleError::TimedOut(limit)),
                    },
                    None => call.await.map_err(|_| ThrottleError::Panicked),
                };
                if let Err(err) = &outcome {
                    log::warn!("Throttled call failed: {}", err);
                }
                // The caller may have stopped waiting.
                let _ = done_tx.send(outcome);
            }
            .boxed()
        });

        self.shared.queued.fetch_add(1, Ordering::AcqRel);
        let submitted = self.sender.send(job).is_ok();
        if !submitted {
            self.shared.queued.fetch_sub(1, Ordering::AcqRel);
        }

        async move {
            if !submitted {
                return Err(ThrottleError::Closed.into());
            }
            match done_rx.await {
                Ok(Ok(result)) => result,
                Ok(Err(err)) => Err(err.into()),
                Err(_) => Err(ThrottleError::Closed.into()),
            }
        }
    }

    /// Returns the number of units queued or executing.
    pub fn pending(&self) -> usize {
        self.shared.queued.load(Ordering::Acquire)
    }

    /// Returns the number of units dispatched so far.
    pub fn dispatched(&self) -> u64 {
        self.shared.dispatched.load(Ordering::Acquire)
    }

    /// Returns the configured dispatch window.
    pub fn window(&self) -> Duration {
        self.config.window
    }

    /// Returns the configured call timeout.
    pub fn call_timeout(&self) -> Option<Duration> {
        self.config.call_timeout
    }
}

impl std::fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestThrottle")
            .field("config", &self.config)
            .field("pending", &self.pending())
            .field("dispatched", &self.dispatched())
            .finish()
    }
}

async fn drain(mut receiver: mpsc::UnboundedReceiver<Job>, shared: Arc<ThrottleShared>, window: Duration) {
    let mut last_dispatch: Option<Instant> = None;

    while let Some(job) = receiver.recv().await {
        if let Some(last) = last_dispatch {
            let elapsed = last.elapsed();
            if elapsed < window {
                let wait = window - elapsed;
                log::debug!("Throttling provider call for {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }

        last_dispatch = Some(Instant::now());
        shared.dispatched.fetch_add(1, Ordering::AcqRel);
        job().await;
        shared.queued.fetch_sub(1, Ordering::AcqRel);
    }

    log::debug!("Request throttle closed");
}
