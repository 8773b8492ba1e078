//! HTTP client for the event service.

use super::envelope::{self, ApiResult};
use super::{CreateFundingRequest, DataSource, DataSourceError};
use crate::domain::{DepositSnapshot, EventId, SystemParameters};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Event service data source over its JSON HTTP API.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    #[serde(alias = "id", alias = "eventId")]
    event_id: EventId,
}

impl HttpDataSource {
    /// Create a new data source. `timeout` bounds every single request.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, DataSourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataSourceError::NetworkError(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DataSourceError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| DataSourceError::NetworkError(e.to_string()))?;
        read_response(response).await
    }
}

/// Turn an HTTP response into a typed payload.
///
/// A failure envelope carried by a non-2xx response keeps its message.
async fn read_response<T: DeserializeOwned>(response: Response) -> Result<T, DataSourceError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(DataSourceError::RateLimited);
    }

    let body = response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| DataSourceError::ParseError(e.to_string()));

    if !status.is_success() {
        let message = body
            .ok()
            .and_then(|b| envelope::decode::<serde_json::Value>(b).ok())
            .and_then(|r| match r {
                ApiResult::Failure(message) => Some(message),
                ApiResult::Success(_) => None,
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        return Err(DataSourceError::HttpError {
            status: status.as_u16(),
            message,
        });
    }

    envelope::decode::<T>(body?)?.into_result()
}

fn is_transient(err: &DataSourceError) -> bool {
    match err {
        DataSourceError::NetworkError(_) | DataSourceError::RateLimited => true,
        DataSourceError::HttpError { status, .. } => *status >= 500,
        DataSourceError::ParseError(_) | DataSourceError::Rejected(_) => false,
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_deposit_status(
        &self,
        event_id: &EventId,
    ) -> Result<DepositSnapshot, DataSourceError> {
        debug!("Fetching deposit status for event={}", event_id);
        self.get_json(&format!("/api/events/{}/deposit", event_id))
            .await
    }

    async fn fetch_system_parameters(&self) -> Result<SystemParameters, DataSourceError> {
        debug!("Fetching system parameters");
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            self.get_json::<SystemParameters>("/api/system-parameters")
                .await
                .map_err(|e| {
                    if is_transient(&e) {
                        warn!("System parameters fetch failed, retrying: {}", e);
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
        })
        .await
    }

    async fn create_funding_request(
        &self,
        request: &CreateFundingRequest,
    ) -> Result<EventId, DataSourceError> {
        debug!(
            "Creating event duration_hours={}, is_rewarded={}, reward_satoshi={}, preheat_hours={:?}",
            request.duration_hours, request.is_rewarded, request.reward_satoshi, request.preheat_hours
        );

        let response = self
            .client
            .post(self.url("/api/events"))
            .json(request)
            .send()
            .await
            .map_err(|e| DataSourceError::NetworkError(e.to_string()))?;

        let created: CreatedEvent = read_response(response).await?;
        Ok(created.event_id)
    }
}
