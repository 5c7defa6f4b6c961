//! Confirmation poller
//!
//! Keeps the list of recent transfers fresh while the verification view is
//! open. Fetches run on a fixed interval, on activation and on demand; each one
//! carries a sequence number and only the newest completed response is applied.
//! Snapshots go out through a watch channel on every applied fetch and on every
//! countdown tick.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::backend::BankingBackend;
use crate::clock::Clock;
use crate::error::BankingError;
use crate::models::Transfer;
use crate::verification::countdown::CodeTracker;
use crate::verification::view::{prepare, VerificationSnapshot, Viewer, CURRENCY_EXCHANGE_DESCRIPTION};

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Re-fetch interval (ms)
    pub poll_interval_ms: u64,
    /// Countdown refresh interval (ms)
    pub tick_interval_ms: u64,
    /// Transfers with this payment description are never shown
    pub excluded_description: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            tick_interval_ms: 1000,
            excluded_description: CURRENCY_EXCHANGE_DESCRIPTION.to_string(),
        }
    }
}

#[derive(Default)]
struct PollerState {
    transfers: Vec<Transfer>,
    next_seq: u64,
    applied_seq: u64,
    in_flight: usize,
    torn_down: bool,
}

pub struct ConfirmationPoller {
    backend: Arc<dyn BankingBackend>,
    clock: Arc<dyn Clock>,
    tracker: CodeTracker,
    config: PollerConfig,
    viewer: Mutex<Option<Viewer>>,
    state: Mutex<PollerState>,
    snapshots: watch::Sender<VerificationSnapshot>,
}

impl ConfirmationPoller {
    pub fn new(
        backend: Arc<dyn BankingBackend>,
        clock: Arc<dyn Clock>,
        tracker: CodeTracker,
        config: PollerConfig,
    ) -> Self {
        let (snapshots, _) = watch::channel(VerificationSnapshot::default());
        Self {
            backend,
            clock,
            tracker,
            config,
            viewer: Mutex::new(None),
            state: Mutex::new(PollerState::default()),
            snapshots,
        }
    }

    pub fn with_viewer(self, viewer: Viewer) -> Self {
        self.set_viewer(Some(viewer));
        self
    }

    pub fn set_viewer(&self, viewer: Option<Viewer>) {
        *self.viewer.lock().unwrap_or_else(|p| p.into_inner()) = viewer;
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, PollerState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn subscribe(&self) -> watch::Receiver<VerificationSnapshot> {
        self.snapshots.subscribe()
    }

    /// Current filtered and sorted collection
    pub fn transfers(&self) -> Vec<Transfer> {
        self.state().transfers.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.state().in_flight > 0
    }

    pub fn is_torn_down(&self) -> bool {
        self.state().torn_down
    }

    /// Render the current collection against the clock right now
    pub fn snapshot(&self) -> VerificationSnapshot {
        let state = self.state();
        self.render(&state)
    }

    fn render(&self, state: &PollerState) -> VerificationSnapshot {
        let viewer = self.viewer.lock().unwrap_or_else(|p| p.into_inner()).clone();
        VerificationSnapshot::build(
            &state.transfers,
            &self.tracker,
            self.clock.now_ms(),
            viewer.as_ref(),
            state.in_flight > 0,
        )
    }

    /// Fetch once and apply the result if it is still the newest.
    ///
    /// Returns whether the collection was replaced.
    pub async fn refresh(&self) -> bool {
        let Some(seq) = self.begin_fetch() else {
            return false;
        };
        self.publish();
        let result = self.backend.fetch_transfers().await;
        let applied = self.complete_fetch(seq, result);
        self.publish();
        applied
    }

    /// Reserve a sequence number, `None` once torn down
    fn begin_fetch(&self) -> Option<u64> {
        let mut state = self.state();
        if state.torn_down {
            return None;
        }
        state.next_seq += 1;
        state.in_flight += 1;
        Some(state.next_seq)
    }

    fn complete_fetch(&self, seq: u64, result: Result<Vec<Transfer>, BankingError>) -> bool {
        let mut state = self.state();
        state.in_flight = state.in_flight.saturating_sub(1);

        if state.torn_down {
            log::debug!("Dropping fetch #{} completed after shutdown", seq);
            return false;
        }

        match result {
            Ok(transfers) => {
                if seq <= state.applied_seq {
                    log::debug!(
                        "Dropping stale fetch #{} (already applied #{})",
                        seq,
                        state.applied_seq
                    );
                    return false;
                }
                state.transfers = prepare(transfers, &self.config.excluded_description);
                state.applied_seq = seq;
                true
            }
            Err(e) => {
                log::warn!("Transfer refresh #{} via {} failed: {}", seq, self.backend.name(), e);
                false
            }
        }
    }

    // Rendered and sent under the state lock so publishes follow applies in order
    fn publish(&self) {
        let state = self.state();
        if state.torn_down {
            return;
        }
        self.snapshots.send_replace(self.render(&state));
    }

    /// Stop accepting responses. In-flight fetches finish but are discarded.
    pub fn teardown(&self) {
        self.state().torn_down = true;
    }

    fn spawn_refresh(self: &Arc<Self>) {
        let poller = Arc::clone(self);
        tokio::spawn(async move {
            poller.refresh().await;
        });
    }

    async fn run(self: Arc<Self>, activate: Arc<Notify>, mut stop: watch::Receiver<bool>) {
        log::info!(
            "Confirmation poller started (poll_interval={}ms, tick_interval={}ms)",
            self.config.poll_interval_ms,
            self.config.tick_interval_ms
        );

        let mut poll = interval(Duration::from_millis(self.config.poll_interval_ms.max(1)));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick = interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // first tick fires immediately: the initial load
                _ = poll.tick() => self.spawn_refresh(),
                _ = tick.tick() => self.publish(),
                _ = activate.notified() => {
                    log::debug!("Poller activated, refreshing now");
                    self.spawn_refresh();
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        log::info!("Confirmation poller stopped");
    }

    /// Start the periodic task
    pub fn spawn(self: Arc<Self>) -> PollerHandle {
        let activate = Arc::new(Notify::new());
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(Arc::clone(&self).run(Arc::clone(&activate), stop_rx));
        PollerHandle {
            poller: self,
            activate,
            stop: stop_tx,
            task: Some(task),
        }
    }
}

/// Owner of a running poller. Dropping it tears the poller down.
pub struct PollerHandle {
    poller: Arc<ConfirmationPoller>,
    activate: Arc<Notify>,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// The view regained focus
    pub fn activate(&self) {
        self.activate.notify_one();
    }

    /// Pull-to-refresh; resolves once this fetch has been applied or dropped
    pub async fn refresh(&self) -> bool {
        self.poller.refresh().await
    }

    pub fn subscribe(&self) -> watch::Receiver<VerificationSnapshot> {
        self.poller.subscribe()
    }

    pub fn poller(&self) -> &Arc<ConfirmationPoller> {
        &self.poller
    }

    pub async fn shutdown(mut self) {
        self.poller.teardown();
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("Confirmation poller task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.poller.teardown();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
