//! Running monitors keyed by event.
//!
//! A monitor that stopped on its own stays readable for the retention window,
//! then is pruned. Retention counts from the first prune pass that sees the
//! monitor stopped.

use super::{MonitorHandle, MonitorView, ScopedPoller};
use crate::domain::EventId;
use futures::FutureExt;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How long a stopped monitor's last view stays readable by default.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(600);

#[derive(Debug)]
struct Entry {
    handle: MonitorHandle,
    stopped_seen: Option<Instant>,
}

#[derive(Debug)]
pub struct MonitorRegistry {
    retention: Duration,
    monitors: RwLock<HashMap<EventId, Entry>>,
}

impl Default for MonitorRegistry {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

fn prune_stopped(monitors: &mut HashMap<EventId, Entry>, retention: Duration) -> usize {
    let now = Instant::now();
    let before = monitors.len();
    monitors.retain(|_, entry| {
        if !entry.handle.is_stopped() {
            return true;
        }
        let seen = *entry.stopped_seen.get_or_insert(now);
        now.duration_since(seen) < retention
    });
    before - monitors.len()
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            retention,
            monitors: RwLock::new(HashMap::new()),
        }
    }

    /// Track a monitor. An existing monitor for the same event is torn down.
    pub async fn insert(&self, handle: MonitorHandle) {
        let event_id = handle.event_id().clone();
        let mut monitors = self.monitors.write().await;
        prune_stopped(&mut monitors, self.retention);
        let previous = monitors.insert(
            event_id.clone(),
            Entry {
                handle,
                stopped_seen: None,
            },
        );
        drop(monitors);
        if let Some(previous) = previous {
            info!(event_id = %event_id, "Replacing existing deposit monitor");
            previous.handle.stop();
        }
    }

    pub async fn view(&self, event_id: &EventId) -> Option<MonitorView> {
        self.monitors
            .read()
            .await
            .get(event_id)
            .map(|entry| entry.handle.view())
    }

    /// Stop and forget a monitor. Returns its last view, if it existed.
    pub async fn stop(&self, event_id: &EventId) -> Option<MonitorView> {
        let entry = self.monitors.write().await.remove(event_id)?;
        entry.handle.stop();
        Some(entry.handle.view())
    }

    /// Drop monitors that have been stopped for longer than the retention
    /// window. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let removed = prune_stopped(&mut *self.monitors.write().await, self.retention);
        if removed > 0 {
            debug!(removed, "Pruned stopped deposit monitors");
        }
        removed
    }

    /// Prune on `interval` until `parent` is cancelled or the handle dropped.
    pub fn spawn_pruner(
        self: &Arc<Self>,
        interval: Duration,
        parent: &CancellationToken,
    ) -> ScopedPoller {
        let registry = self.clone();
        ScopedPoller::spawn("monitor-prune", interval, parent, move || {
            let registry = registry.clone();
            async move {
                registry.prune().await;
                ControlFlow::Continue(())
            }
            .boxed()
        })
    }

    /// Tracked monitors, including stopped ones still inside the retention window.
    pub async fn len(&self) -> usize {
        self.monitors.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.monitors.read().await.is_empty()
    }

    /// Monitors still polling.
    pub async fn active(&self) -> usize {
        self.monitors
            .read()
            .await
            .values()
            .filter(|entry| !entry.handle.is_stopped())
            .count()
    }

    /// Stop every monitor.
    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.monitors.write().await.drain().collect();
        if !drained.is_empty() {
            info!(count = drained.len(), "Stopping deposit monitors");
        }
        for (_, entry) in drained {
            entry.handle.stop();
        }
    }
}
