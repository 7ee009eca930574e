//! Debounced route recalculation
//!
//! The [`RouteCalculationController`] sits between an address form and the
//! [`RouteClient`]. It is told about every input change, waits for the input
//! to settle, skips work that would not change anything, and publishes one
//! [`RouteState`] through a watch channel.

mod state;

pub use state::*;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::RouteClient;
use crate::model::PlaceInput;
use crate::model::RouteRequest;

/// Debounced, de-duplicating front controller for route calculation.
///
/// Each input change restarts the debounce timer; only when it elapses
/// uninterrupted does a calculation start. At most one timer is pending at a
/// time. A calculation already in flight is never aborted, but its outcome
/// is applied only if it still answers the current input.
///
/// Dropping the controller (or calling [`close`](Self::close)) clears the
/// pending timer; no state is published afterwards.
///
/// # Example
///
/// ```ignore
/// use route_cache::controller::{ControllerConfig, RouteCalculationController};
///
/// let controller = RouteCalculationController::new(client.clone(), ControllerConfig::default());
/// let mut updates = controller.subscribe();
///
/// controller.on_input_change("Zurich Airport", Some("Lucerne".into()), vec![]);
/// updates.changed().await?;
/// ```
pub struct RouteCalculationController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    client: RouteClient,
    config: ControllerConfig,
    state: watch::Sender<RouteState>,
    pending: Mutex<Pending>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Pending {
    /// Latest input, whether or not it has been calculated.
    current: Option<RouteRequest>,
    /// Input whose outcome is currently published.
    applied: Option<RouteRequest>,
    /// Most recently started calculation.
    started: Option<RouteRequest>,
    in_flight: usize,
    timer: Option<JoinHandle<()>>,
}

impl RouteCalculationController {
    /// Creates a controller that calculates through `client`.
    pub fn new(client: RouteClient, config: ControllerConfig) -> Self {
        let (state, _) = watch::channel(RouteState::default());
        Self {
            inner: Arc::new(ControllerInner {
                client,
                config,
                state,
                pending: Mutex::new(Pending::default()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Notifies the controller of a change to any address field.
    ///
    /// Selection metadata is unwrapped to plain addresses.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn on_input_change(
        &self,
        origin: impl Into<PlaceInput>,
        destination: Option<PlaceInput>,
        stops: Vec<PlaceInput>,
    ) {
        self.submit(RouteRequest::from_inputs(origin.into(), destination, stops));
    }

    /// Notifies the controller of a new, already normalized request.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn submit(&self, request: RouteRequest) {
        if self.inner.cancel.is_cancelled() {
            return;
        }

        let mut pending = self.inner.lock();
        pending.current = Some(request.clone());
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }

        let inner = self.inner.clone();
        pending.timer = Some(tokio::spawn(async move {
            tokio::select! {
                _ = inner.cancel.cancelled() => {}
                _ = tokio::time::sleep(inner.config.debounce) => inner.start(request),
            }
        }));
    }

    /// Returns a receiver that is notified whenever the state changes.
    pub fn subscribe(&self) -> watch::Receiver<RouteState> {
        self.inner.state.subscribe()
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> RouteState {
        self.inner.state.borrow().clone()
    }

    /// Returns the client calculations run through.
    pub fn client(&self) -> &RouteClient {
        &self.inner.client
    }

    /// Stops the controller: clears the pending timer and suppresses any
    /// further state updates. Idempotent.
    pub fn close(&self) {
        self.inner.cancel.cancel();
        if let Some(timer) = self.inner.lock().timer.take() {
            timer.abort();
        }
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}

impl Drop for RouteCalculationController {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for RouteCalculationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteCalculationController")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state.borrow())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl ControllerInner {
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs when the debounce timer elapses.
    fn start(self: &Arc<Self>, request: RouteRequest) {
        if !request.is_calculable() {
            log::debug!("Incomplete route input, keeping previous result");
            return;
        }

        {
            let mut pending = self.lock();
            if pending.current.as_ref() != Some(&request) {
                return;
            }
            if pending.applied.as_ref() == Some(&request) {
                log::debug!("Route input unchanged, skipping recalculation");
                return;
            }
            if pending.in_flight > 0 && pending.started.as_ref() == Some(&request) {
                log::debug!("Route calculation for this input already in flight");
                return;
            }
            pending.started = Some(request.clone());
            pending.in_flight += 1;
        }

        self.state.send_if_modified(|state| !std::mem::replace(&mut state.is_calculating, true));

        let inner = self.clone();
        tokio::spawn(async move { inner.calculate(request).await });
    }

    async fn calculate(self: Arc<Self>, request: RouteRequest) {
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => return,
            response = self.client.resolve_route(&request) => response.into_inner(),
        };

        let mut pending = self.lock();
        pending.in_flight = pending.in_flight.saturating_sub(1);
        if self.cancel.is_cancelled() {
            return;
        }

        if pending.current.as_ref() == Some(&request) {
            let error = outcome.error_message();
            pending.applied = Some(request);
            self.state.send_modify(|state| {
                state.result = Some(outcome);
                state.error = error;
                state.is_calculating = false;
            });
        } else {
            log::debug!("Discarding route result for superseded input");
            if pending.in_flight == 0 {
                self.state
                    .send_if_modified(|state| std::mem::replace(&mut state.is_calculating, false));
            }
        }
    }
}
