//! Response-shape handling for the event service.
//!
//! Some endpoints answer with the payload itself, others wrap it in a
//! `{success, data, message}` envelope. The shape is resolved here, once,
//! into an [`ApiResult`].

use super::DataSourceError;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A decoded service response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResult<T> {
    Success(T),
    Failure(String),
}

impl<T> ApiResult<T> {
    pub fn into_result(self) -> Result<T, DataSourceError> {
        match self {
            ApiResult::Success(value) => Ok(value),
            ApiResult::Failure(message) => Err(DataSourceError::Rejected(message)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireBody<T> {
    Envelope {
        success: bool,
        data: Option<T>,
        message: Option<String>,
    },
    Bare(T),
}

/// Decode a JSON body that may or may not be enveloped.
pub fn decode<T: DeserializeOwned>(body: serde_json::Value) -> Result<ApiResult<T>, DataSourceError> {
    let wire: WireBody<T> = serde_json::from_value(body)
        .map_err(|e| DataSourceError::ParseError(e.to_string()))?;

    Ok(match wire {
        WireBody::Envelope {
            success: true,
            data: Some(data),
            ..
        } => ApiResult::Success(data),
        WireBody::Envelope {
            success: true,
            data: None,
            ..
        } => ApiResult::Failure("response envelope has no data".to_string()),
        WireBody::Envelope {
            success: false,
            message,
            ..
        } => ApiResult::Failure(message.unwrap_or_else(|| "request failed".to_string())),
        WireBody::Bare(data) => ApiResult::Success(data),
    })
}
