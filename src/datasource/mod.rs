//! Data source abstraction for the event service: deposit status, pricing
//! parameters and event creation.

use crate::domain::{
    DepositSnapshot, EventId, FundingRequest, Satoshi, SystemParameters, ValidationError,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod envelope;
pub mod http;
pub mod mock;

pub use envelope::ApiResult;
pub use http::HttpDataSource;
pub use mock::MockDataSource;

/// External collaborators of the funding engine.
///
/// Implementations must not retry `fetch_deposit_status`; the deposit
/// monitor's poll interval is the only retry mechanism for it.
#[async_trait]
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Fetch the latest deposit snapshot for an event.
    async fn fetch_deposit_status(
        &self,
        event_id: &EventId,
    ) -> Result<DepositSnapshot, DataSourceError>;

    /// Fetch the current pricing parameters.
    async fn fetch_system_parameters(&self) -> Result<SystemParameters, DataSourceError>;

    /// Create an event and its deposit address.
    ///
    /// # Returns
    /// The new event's identifier only. Amounts due are read back through
    /// `fetch_deposit_status`, never taken from this response.
    async fn create_funding_request(
        &self,
        request: &CreateFundingRequest,
    ) -> Result<EventId, DataSourceError>;
}

/// Wire body of the create-event call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFundingRequest {
    pub duration_hours: u32,
    pub is_rewarded: bool,
    pub reward_satoshi: Satoshi,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preheat_hours: Option<u32>,
}

impl CreateFundingRequest {
    /// Build the wire body from a creator's request, validating it first.
    pub fn from_request(request: &FundingRequest) -> Result<Self, ValidationError> {
        request.validate()?;
        let duration_hours = request
            .duration()
            .ok_or(ValidationError::InvalidDuration(request.duration_hours))?;
        Ok(Self {
            duration_hours,
            is_rewarded: request.is_rewarded,
            reward_satoshi: request.effective_reward(),
            preheat_hours: request.checked_preheat_hours()?,
        })
    }
}

/// Error type for data source operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 404 unknown event, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded
    RateLimited,
    /// The service answered with an explicit failure message
    Rejected(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::Rejected(msg) => write!(f, "Rejected: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
