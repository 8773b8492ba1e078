use crate::datasource::{CreateFundingRequest, DataSource, DataSourceError};
use crate::db::Repository;
use crate::domain::{EventId, FundingRequest, Submission, SystemParameters, ValidationError};
use crate::engine::{self, Clock, FundingQuote, Quote};
use crate::monitor::{
    DepositMonitor, MonitorRegistry, MonitorSettings, MonitorView, ScopedPoller,
    DEFAULT_POLL_INTERVAL, DEFAULT_TICK_INTERVAL,
};
use crate::orchestration::params::ParameterCache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Prices, submits and monitors funding requests.
#[derive(Debug)]
pub struct FundingService {
    datasource: Arc<dyn DataSource>,
    clock: Arc<dyn Clock>,
    params: Arc<ParameterCache>,
    repo: Arc<Repository>,
    monitors: Arc<MonitorRegistry>,
    poll_interval: Duration,
    tick_interval: Duration,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedFunding {
    pub event_id: EventId,
    pub quote: FundingQuote,
}

impl FundingService {
    pub fn new(
        datasource: Arc<dyn DataSource>,
        clock: Arc<dyn Clock>,
        params: Arc<ParameterCache>,
        repo: Arc<Repository>,
    ) -> Self {
        Self {
            datasource,
            clock,
            params,
            repo,
            monitors: Arc::new(MonitorRegistry::new()),
            poll_interval: DEFAULT_POLL_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Override the monitor poll and countdown intervals.
    pub fn with_intervals(mut self, poll_interval: Duration, tick_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.tick_interval = tick_interval;
        self
    }

    /// How long a finished monitor's last view stays readable.
    pub fn with_monitor_retention(mut self, retention: Duration) -> Self {
        self.monitors = Arc::new(MonitorRegistry::with_retention(retention));
        self
    }

    /// Periodically drop finished monitors past their retention window.
    pub fn spawn_monitor_pruner(
        &self,
        interval: Duration,
        parent: &CancellationToken,
    ) -> ScopedPoller {
        self.monitors.spawn_pruner(interval, parent)
    }

    pub fn parameters(&self) -> &Arc<ParameterCache> {
        &self.params
    }

    /// Price a request against the current parameter snapshot.
    pub async fn quote(&self, request: &FundingRequest) -> Result<Quote, FundingError> {
        let params = self.params.current().await;
        Ok(engine::quote(request, params.as_ref())?)
    }

    /// Validate, price and create an event, then start monitoring its deposit.
    ///
    /// Nothing is sent to the event service unless the request validates and
    /// prices. A failed ledger write is logged and does not fail the
    /// submission, since the event already exists.
    pub async fn submit(&self, request: &FundingRequest) -> Result<SubmittedFunding, FundingError> {
        let params = self
            .params
            .current()
            .await
            .ok_or(FundingError::PricingUnavailable)?;
        let quote = match engine::quote(request, Some(&params))? {
            Quote::Priced(quote) => quote,
            Quote::PricingUnavailable => return Err(FundingError::PricingUnavailable),
        };
        let body = CreateFundingRequest::from_request(request)?;

        let event_id = self.datasource.create_funding_request(&body).await?;
        info!(
            event_id = %event_id,
            total = %quote.total_satoshi,
            "Funding request submitted"
        );

        let submission = Submission {
            event_id: event_id.clone(),
            duration_hours: body.duration_hours,
            is_rewarded: body.is_rewarded,
            reward_satoshi: body.reward_satoshi,
            preheat_hours: body.preheat_hours,
            quoted_total_satoshi: quote.total_satoshi,
            created_at: self.clock.now(),
        };
        if let Err(e) = self.repo.insert_submission(&submission).await {
            warn!(event_id = %event_id, "Failed to record submission: {}", e);
        }

        let settings = self.monitor_settings(&params);
        self.spawn_monitor(event_id.clone(), settings).await;

        Ok(SubmittedFunding { event_id, quote })
    }

    /// Start (or restart) monitoring an existing event.
    pub async fn start_monitor(&self, event_id: EventId) -> Result<MonitorView, FundingError> {
        let params = self
            .params
            .current()
            .await
            .ok_or(FundingError::PricingUnavailable)?;
        let settings = self.monitor_settings(&params);
        Ok(self.spawn_monitor(event_id, settings).await)
    }

    /// Tear down an event's monitor. Returns its last view.
    pub async fn stop_monitor(&self, event_id: &EventId) -> Option<MonitorView> {
        let view = self.monitors.stop(event_id).await;
        if view.is_some() {
            info!(event_id = %event_id, "Deposit monitor stopped");
        }
        view
    }

    pub async fn monitor_view(&self, event_id: &EventId) -> Option<MonitorView> {
        self.monitors.view(event_id).await
    }

    /// Monitors still polling. Finished ones inside retention are not counted.
    pub async fn active_monitors(&self) -> usize {
        self.monitors.active().await
    }

    pub async fn submissions(&self, limit: u32) -> Result<Vec<Submission>, FundingError> {
        Ok(self.repo.list_submissions(limit).await?)
    }

    /// Stop every running monitor.
    pub async fn shutdown(&self) {
        self.monitors.shutdown().await;
    }

    fn monitor_settings(&self, params: &SystemParameters) -> MonitorSettings {
        MonitorSettings {
            poll_interval: self.poll_interval,
            tick_interval: self.tick_interval,
            sponsorship_threshold: params.sponsorship_threshold(),
        }
    }

    async fn spawn_monitor(&self, event_id: EventId, settings: MonitorSettings) -> MonitorView {
        let handle = DepositMonitor::spawn(
            event_id,
            self.datasource.clone(),
            self.clock.clone(),
            settings,
        );
        let view = handle.view();
        self.monitors.insert(handle).await;
        view
    }
}

#[derive(Debug, Error)]
pub enum FundingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("pricing parameters are unavailable")]
    PricingUnavailable,
    #[error("event service error: {0}")]
    DataSource(#[from] DataSourceError),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}
