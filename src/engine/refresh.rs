use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::geo::sort_by_distance;
use crate::state::{AppState, DriverScope, DriverView};

/// Replaces the ride snapshot with the service's list. A failed read keeps the last
/// snapshot; returns whether the snapshot was replaced.
pub async fn refresh_rides(state: &AppState) -> bool {
    let start = Instant::now();
    let result = state.service.list_rides().await;
    observe(state, "rides", start);

    match result {
        Ok(rides) => {
            let inconsistent = rides.iter().filter(|ride| !ride.is_consistent()).count();
            if inconsistent > 0 {
                warn!(inconsistent, "service returned rides with mismatched driver/status");
            }
            debug!(count = rides.len(), "ride snapshot replaced");
            state.rides.send_replace(Arc::new(rides));
            true
        }
        Err(err) => {
            warn!(error = %err, "ride refresh failed; keeping last snapshot");
            false
        }
    }
}

/// Re-reads whichever driver set is currently displayed. A result is dropped when the
/// display switched scope while the read was in flight.
pub async fn refresh_drivers(state: &AppState) -> bool {
    let scope = state.drivers.borrow().scope;
    let start = Instant::now();
    let result = match scope {
        DriverScope::All => state.service.list_drivers().await,
        DriverScope::Nearby { origin, radius_km } => {
            state.service.nearby_drivers(origin, radius_km).await
        }
    };
    observe(state, "drivers", start);

    match result {
        Ok(mut drivers) => {
            if let DriverScope::Nearby { origin, .. } = scope {
                sort_by_distance(&mut drivers, &origin);
            }
            let count = drivers.len();
            let applied = state.drivers.send_if_modified(|view| {
                if view.scope != scope {
                    return false;
                }
                *view = DriverView {
                    scope,
                    drivers: Arc::new(drivers),
                };
                true
            });
            if applied {
                debug!(count, "driver snapshot replaced");
            } else {
                debug!(count, "driver scope changed during refresh; result dropped");
            }
            applied
        }
        Err(err) => {
            warn!(error = %err, "driver refresh failed; keeping last snapshot");
            false
        }
    }
}

pub async fn refresh_all(state: &AppState) {
    futures::future::join(refresh_rides(state), refresh_drivers(state)).await;
}

fn observe(state: &AppState, snapshot: &str, start: Instant) {
    state
        .metrics
        .refresh_latency_seconds
        .with_label_values(&[snapshot])
        .observe(start.elapsed().as_secs_f64());
}

/// Background refresh loop. Stops when `shutdown` is called or the handle is dropped.
pub struct Poller {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn spawn(state: Arc<AppState>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_poller(state, period, shutdown_rx));
        Self {
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "poller task ended abnormally");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_poller(state: Arc<AppState>, period: Duration, mut shutdown_rx: oneshot::Receiver<()>) {
    info!(period_ms = period.as_millis() as u64, "refresh poller started");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the surface does its own initial load.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => refresh_all(&state).await,
        }
    }

    info!("refresh poller stopped");
}
