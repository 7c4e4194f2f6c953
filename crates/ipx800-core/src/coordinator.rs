// ── State coordinator ──
//
// One per hub. Fetches the full state snapshot on a fixed interval and on
// demand, and publishes it through a `watch` channel that every entity
// adapter reads from.
//
// On-demand requests are debounced: any number of `request_refresh` calls
// inside one window collapse into a single fetch. Requests never block;
// `refresh_now` is the awaited variant.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use ipx800_api::{HubClient, StateSnapshot};
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::MIN_RECOMMENDED_SCAN_INTERVAL;
use crate::error::CoreError;

/// The published, read-only view of hub state.
#[derive(Debug, Clone, Default)]
pub struct StateView {
    pub state: Arc<StateSnapshot>,
    /// `None` until the first successful fetch.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Message of the most recent failed fetch, cleared on success.
    pub last_error: Option<String>,
}

pub struct StateCoordinator<C: HubClient> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    client: Arc<C>,
    interval: Duration,
    debounce: Duration,
    view: watch::Sender<StateView>,
    pending: AtomicBool,
    wake: Notify,
    /// Serializes fetches so a slow one never races a newer one.
    fetch_lock: Mutex<()>,
}

impl<C: HubClient> Clone for StateCoordinator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: HubClient> StateCoordinator<C> {
    pub fn new(client: Arc<C>, interval: Duration, debounce: Duration) -> Self {
        if interval < MIN_RECOMMENDED_SCAN_INTERVAL {
            warn!(
                interval_secs = interval.as_secs_f64(),
                "scan interval under 10s puts a heavy load on the hub"
            );
        }
        let (view, _) = watch::channel(StateView::default());
        Self {
            inner: Arc::new(Inner {
                client,
                interval,
                debounce,
                view,
                pending: AtomicBool::new(false),
                wake: Notify::new(),
                fetch_lock: Mutex::new(()),
            }),
        }
    }

    /// Fetch now and wait for the snapshot to be published.
    pub async fn refresh_now(&self) -> Result<(), CoreError> {
        let _guard = self.inner.fetch_lock.lock().await;
        match self.inner.client.state().await {
            Ok(state) => {
                debug!(channels = state.len(), "state refreshed");
                self.inner.view.send_replace(StateView {
                    state: Arc::new(state),
                    fetched_at: Some(Utc::now()),
                    last_error: None,
                });
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.inner.view.send_modify(|v| v.last_error = Some(message));
                Err(e.into())
            }
        }
    }

    /// Ask for an out-of-cycle refresh. Returns immediately; requests
    /// arriving within the debounce window share one fetch.
    pub fn request_refresh(&self) {
        if !self.inner.pending.swap(true, Ordering::SeqCst) {
            self.inner.wake.notify_one();
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> StateView {
        self.inner.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StateView> {
        self.inner.view.subscribe()
    }

    /// Start the polling task. It stops when `cancel` fires.
    pub fn spawn(&self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(poll_task(self.clone(), cancel))
    }

    async fn refresh_logged(&self, trigger: &'static str) {
        if let Err(e) = self.refresh_now().await {
            warn!(error = %e, trigger, "state refresh failed");
        }
    }
}

async fn poll_task<C: HubClient>(coordinator: StateCoordinator<C>, cancel: CancellationToken) {
    let inner = Arc::clone(&coordinator.inner);
    let mut interval = tokio::time::interval(inner.interval.max(Duration::from_secs(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = inner.wake.notified() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(inner.debounce) => {}
                }
                if inner.pending.swap(false, Ordering::SeqCst) {
                    coordinator.refresh_logged("request").await;
                    interval.reset();
                }
            }
            _ = interval.tick() => {
                coordinator.refresh_logged("interval").await;
            }
        }
    }

    debug!("state coordinator stopped");
}
