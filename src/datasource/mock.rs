//! Mock data source for testing without network calls.

use super::{CreateFundingRequest, DataSource, DataSourceError};
use crate::domain::{DepositSnapshot, EventId, SystemParameters};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

type DepositResponse = Result<DepositSnapshot, DataSourceError>;

/// Mock data source with scripted deposit responses.
///
/// Each event has a queue of responses. Every fetch consumes the front of the
/// queue except the last entry, which repeats. Events without a queue fall
/// back to the default snapshot, or a 404.
#[derive(Debug, Default)]
pub struct MockDataSource {
    params: RwLock<Option<SystemParameters>>,
    deposits: Mutex<HashMap<EventId, VecDeque<DepositResponse>>>,
    default_snapshot: Option<DepositSnapshot>,
    fetch_delay: Option<Duration>,
    create_error: Option<DataSourceError>,
    created: Mutex<Vec<(EventId, CreateFundingRequest)>>,
    fetch_count: AtomicUsize,
    params_fetch_count: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockDataSource {
    /// Create a new mock data source with empty data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parameters returned by fetch_system_parameters.
    pub fn with_parameters(mut self, params: SystemParameters) -> Self {
        *self.params.get_mut() = Some(params);
        self
    }

    /// Queue one deposit response for an event.
    pub fn with_deposit_response(mut self, event_id: &EventId, response: DepositResponse) -> Self {
        self.deposits
            .get_mut()
            .entry(event_id.clone())
            .or_default()
            .push_back(response);
        self
    }

    /// Queue several deposit responses for an event, in order.
    pub fn with_deposit_responses(
        mut self,
        event_id: &EventId,
        responses: Vec<DepositResponse>,
    ) -> Self {
        self.deposits
            .get_mut()
            .entry(event_id.clone())
            .or_default()
            .extend(responses);
        self
    }

    /// Snapshot returned for events that have no scripted responses.
    pub fn with_default_snapshot(mut self, snapshot: DepositSnapshot) -> Self {
        self.default_snapshot = Some(snapshot);
        self
    }

    /// Delay every deposit fetch, to observe in-flight behaviour.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Make create_funding_request fail.
    pub fn with_create_error(mut self, err: DataSourceError) -> Self {
        self.create_error = Some(err);
        self
    }

    pub async fn set_parameters(&self, params: Option<SystemParameters>) {
        *self.params.write().await = params;
    }

    /// Replace an event's queued responses.
    pub async fn script_deposits(&self, event_id: &EventId, responses: Vec<DepositResponse>) {
        self.deposits
            .lock()
            .await
            .insert(event_id.clone(), responses.into_iter().collect());
    }

    /// Number of deposit fetches started so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Number of system-parameter fetches so far.
    pub fn params_fetch_count(&self) -> usize {
        self.params_fetch_count.load(Ordering::SeqCst)
    }

    /// Highest number of deposit fetches that ran at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Events created so far, oldest first.
    pub async fn created(&self) -> Vec<(EventId, CreateFundingRequest)> {
        self.created.lock().await.clone()
    }

    async fn next_deposit_response(&self, event_id: &EventId) -> DepositResponse {
        let mut deposits = self.deposits.lock().await;
        if let Some(queue) = deposits.get_mut(event_id) {
            let next = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            if let Some(response) = next {
                return response;
            }
        }
        self.default_snapshot
            .clone()
            .ok_or_else(|| DataSourceError::HttpError {
                status: 404,
                message: format!("unknown event {}", event_id),
            })
    }
}

/// Decrements the in-flight counter even when a fetch is cancelled mid-way.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn fetch_deposit_status(
        &self,
        event_id: &EventId,
    ) -> Result<DepositSnapshot, DataSourceError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let response = self.next_deposit_response(event_id).await;
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        response
    }

    async fn fetch_system_parameters(&self) -> Result<SystemParameters, DataSourceError> {
        self.params_fetch_count.fetch_add(1, Ordering::SeqCst);
        self.params
            .read()
            .await
            .clone()
            .ok_or_else(|| DataSourceError::HttpError {
                status: 503,
                message: "parameters not configured".to_string(),
            })
    }

    async fn create_funding_request(
        &self,
        request: &CreateFundingRequest,
    ) -> Result<EventId, DataSourceError> {
        if let Some(err) = &self.create_error {
            return Err(err.clone());
        }
        let event_id = EventId::new(format!("evt-{}", Uuid::new_v4()));
        self.created
            .lock()
            .await
            .push((event_id.clone(), request.clone()));
        Ok(event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DepositStatus, Satoshi};
    use chrono::Utc;

    fn make_snapshot(status: DepositStatus) -> DepositSnapshot {
        DepositSnapshot {
            deposit_address: "bc1qmock".to_string(),
            expected_amount_satoshi: Satoshi::new(1000),
            received_amount_satoshi: Satoshi::ZERO,
            status,
            initial_timeout_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_scripted_responses_then_last_repeats() {
        let id = EventId::new("evt-1".to_string());
        let mock = MockDataSource::new().with_deposit_responses(
            &id,
            vec![
                Ok(make_snapshot(DepositStatus::Pending)),
                Ok(make_snapshot(DepositStatus::Completed)),
            ],
        );

        let first = mock.fetch_deposit_status(&id).await.unwrap();
        assert_eq!(first.status, DepositStatus::Pending);
        for _ in 0..3 {
            let next = mock.fetch_deposit_status(&id).await.unwrap();
            assert_eq!(next.status, DepositStatus::Completed);
        }
        assert_eq!(mock.fetch_count(), 4);
        assert_eq!(mock.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_unknown_event_is_404() {
        let mock = MockDataSource::new();
        let err = mock
            .fetch_deposit_status(&EventId::new("missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, DataSourceError::HttpError { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_default_snapshot_used_for_unscripted_events() {
        let mock = MockDataSource::new().with_default_snapshot(make_snapshot(DepositStatus::Pending));
        let snapshot = mock
            .fetch_deposit_status(&EventId::new("any".to_string()))
            .await
            .unwrap();
        assert_eq!(snapshot.status, DepositStatus::Pending);
    }

    #[tokio::test]
    async fn test_parameters_unavailable_until_set() {
        let mock = MockDataSource::new();
        assert!(mock.fetch_system_parameters().await.is_err());
    }

    #[tokio::test]
    async fn test_create_records_request() {
        let mock = MockDataSource::new();
        let request = CreateFundingRequest {
            duration_hours: 10,
            is_rewarded: false,
            reward_satoshi: Satoshi::ZERO,
            preheat_hours: None,
        };
        let id = mock.create_funding_request(&request).await.unwrap();
        let created = mock.created().await;
        assert_eq!(created, vec![(id, request)]);
    }
}
