//! Deposit monitoring: polls the deposit status of one event, classifies
//! each snapshot and counts down to the deposit deadline.
//!
//! Each monitor owns two [`ScopedPoller`]s under one cancellation token:
//! the deposit poll and the countdown ticker. Both stop when a terminal
//! outcome is reached or when the [`MonitorHandle`] is stopped or dropped.

use crate::datasource::DataSource;
use crate::domain::{EventId, Satoshi};
use crate::engine::{Clock, CountdownEvent};
use futures::FutureExt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod poller;
pub mod registry;
pub mod state;

pub use poller::ScopedPoller;
pub use registry::MonitorRegistry;
pub use state::{FetchApplied, MonitorPhase, MonitorState, MonitorView};

/// Default time between deposit polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Default countdown resolution.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub tick_interval: Duration,
    pub sponsorship_threshold: Satoshi,
}

impl MonitorSettings {
    pub fn new(sponsorship_threshold: Satoshi) -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
            sponsorship_threshold,
        }
    }
}

/// State shared by a monitor's two pollers.
struct Shared {
    event_id: EventId,
    datasource: Arc<dyn DataSource>,
    clock: Arc<dyn Clock>,
    state: Mutex<MonitorState>,
    view_tx: watch::Sender<MonitorView>,
    cancel: CancellationToken,
}

impl Shared {
    async fn poll_once(&self) -> ControlFlow<()> {
        let Some(seq) = self.state.lock().await.begin_fetch() else {
            return ControlFlow::Break(());
        };

        let result = self.datasource.fetch_deposit_status(&self.event_id).await;

        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let applied = state.apply_fetch(seq, result, now);
        if matches!(applied, FetchApplied::Terminal(_)) {
            // A published terminal view implies the monitor is already stopped.
            self.cancel.cancel();
        }
        self.view_tx.send_replace(state.view(now));
        drop(state);

        match applied {
            FetchApplied::Continue => ControlFlow::Continue(()),
            FetchApplied::Terminal(outcome) => {
                info!(
                    event_id = %self.event_id,
                    %outcome,
                    "Deposit monitor reached terminal outcome"
                );
                ControlFlow::Break(())
            }
            FetchApplied::FirstFailure(err) => {
                warn!(event_id = %self.event_id, "Deposit status fetch failed: {}", err);
                ControlFlow::Continue(())
            }
            FetchApplied::RetryLater(err) => {
                debug!(event_id = %self.event_id, seq, "Deposit status fetch failed again: {}", err);
                ControlFlow::Continue(())
            }
            FetchApplied::Stale => {
                debug!(event_id = %self.event_id, seq, "Discarded stale deposit snapshot");
                ControlFlow::Continue(())
            }
            FetchApplied::Ignored => ControlFlow::Break(()),
        }
    }

    async fn tick_countdown(&self, poll_waker: &Notify) -> ControlFlow<()> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        if state.phase() == MonitorPhase::Terminal {
            return ControlFlow::Break(());
        }
        let event = state.tick_countdown(now);
        self.view_tx.send_replace(state.view(now));
        drop(state);

        match event {
            Some(CountdownEvent::Expired) => {
                info!(event_id = %self.event_id, "Deposit deadline reached, checking once more");
                poll_waker.notify_one();
                ControlFlow::Break(())
            }
            Some(CountdownEvent::Tick { .. }) | None => ControlFlow::Continue(()),
        }
    }
}

/// Entry point for watching one event's deposit.
pub struct DepositMonitor;

impl DepositMonitor {
    /// Start monitoring. The first fetch is issued immediately.
    pub fn spawn(
        event_id: EventId,
        datasource: Arc<dyn DataSource>,
        clock: Arc<dyn Clock>,
        settings: MonitorSettings,
    ) -> MonitorHandle {
        let state = MonitorState::new(event_id.clone(), settings.sponsorship_threshold);
        let (view_tx, view_rx) = watch::channel(state.view(clock.now()));
        let cancel = CancellationToken::new();

        let shared = Arc::new(Shared {
            event_id: event_id.clone(),
            datasource,
            clock,
            state: Mutex::new(state),
            view_tx,
            cancel: cancel.clone(),
        });

        info!(
            event_id = %event_id,
            poll_interval = ?settings.poll_interval,
            "Starting deposit monitor"
        );

        let poll = {
            let shared = shared.clone();
            ScopedPoller::spawn("deposit-poll", settings.poll_interval, &cancel, move || {
                let shared = shared.clone();
                async move { shared.poll_once().await }.boxed()
            })
        };

        let countdown = {
            let shared = shared.clone();
            let poll_waker = poll.waker();
            ScopedPoller::spawn("countdown", settings.tick_interval, &cancel, move || {
                let shared = shared.clone();
                let poll_waker = poll_waker.clone();
                async move { shared.tick_countdown(&poll_waker).await }.boxed()
            })
        };

        MonitorHandle {
            event_id,
            cancel,
            view: view_rx,
            poll,
            countdown,
        }
    }
}

/// Owning handle of a running monitor. Dropping it tears the monitor down.
pub struct MonitorHandle {
    event_id: EventId,
    cancel: CancellationToken,
    view: watch::Receiver<MonitorView>,
    poll: ScopedPoller,
    countdown: ScopedPoller,
}

impl MonitorHandle {
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Latest published view.
    pub fn view(&self) -> MonitorView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorView> {
        self.view.clone()
    }

    /// Tear down both pollers. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// True after teardown or a terminal outcome.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True once both poller tasks have exited.
    pub fn is_finished(&self) -> bool {
        self.poll.is_finished() && self.countdown.is_finished()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("event_id", &self.event_id)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
