//! Cached pricing parameters with a background refresher.
//!
//! Only the refresher talks to the parameters service. Request paths read
//! whatever is cached and never wait on the network.

use crate::datasource::{DataSource, DataSourceError};
use crate::domain::{ParameterError, SystemParameters};
use crate::engine::Clock;
use crate::monitor::ScopedPoller;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct Cached {
    params: SystemParameters,
    fetched_at: DateTime<Utc>,
}

/// Why a refresh left the cached snapshot untouched.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("parameter fetch failed: {0}")]
    Fetch(#[from] DataSourceError),
    #[error("rejected parameter snapshot: {0}")]
    Rejected(#[from] ParameterError),
}

/// Shared holder of the latest [`SystemParameters`] snapshot.
///
/// Callers receive clones; a computation never observes a snapshot that
/// changes under it.
#[derive(Debug)]
pub struct ParameterCache {
    datasource: Arc<dyn DataSource>,
    clock: Arc<dyn Clock>,
    max_age: chrono::Duration,
    cached: RwLock<Option<Cached>>,
}

impl ParameterCache {
    pub fn new(datasource: Arc<dyn DataSource>, clock: Arc<dyn Clock>, max_age: Duration) -> Self {
        Self {
            datasource,
            clock,
            max_age: chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX),
            cached: RwLock::new(None),
        }
    }

    pub async fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.cached.read().await.as_ref().map(|c| c.fetched_at)
    }

    /// True when nothing is cached or the cached snapshot is older than `max_age`.
    pub async fn is_stale(&self) -> bool {
        match self.fetched_at().await {
            Some(fetched_at) => self.clock.now() - fetched_at > self.max_age,
            None => true,
        }
    }

    /// Fetch a fresh snapshot and cache it.
    ///
    /// A snapshot that fails validation is dropped and the previous one kept.
    pub async fn refresh(&self) -> Result<SystemParameters, RefreshError> {
        let params = self.datasource.fetch_system_parameters().await?;
        params.validate()?;
        let fetched_at = self.clock.now();
        *self.cached.write().await = Some(Cached {
            params: params.clone(),
            fetched_at,
        });
        debug!(%fetched_at, "System parameters refreshed");
        Ok(params)
    }

    /// Snapshot for a computation. `None` means pricing is unavailable.
    ///
    /// A stale snapshot is still served, with a warning.
    pub async fn current(&self) -> Option<SystemParameters> {
        let cached = self.cached.read().await.clone()?;
        let age = self.clock.now() - cached.fetched_at;
        if age > self.max_age {
            warn!(age_secs = age.num_seconds(), "Serving stale system parameters");
        }
        Some(cached.params)
    }

    /// Keep the cache warm until `parent` is cancelled or the handle dropped.
    pub fn spawn_refresher(
        self: &Arc<Self>,
        interval: Duration,
        parent: &CancellationToken,
    ) -> ScopedPoller {
        info!(?interval, "Starting parameter refresher");
        let cache = self.clone();
        ScopedPoller::spawn("params-refresh", interval, parent, move || {
            let cache = cache.clone();
            async move {
                if let Err(e) = cache.refresh().await {
                    warn!("Scheduled parameter refresh failed: {}", e);
                }
                ControlFlow::Continue(())
            }
            .boxed()
        })
    }
}
