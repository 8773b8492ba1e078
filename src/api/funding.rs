use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{EventId, FundingRequest, Satoshi};
use crate::error::AppError;
use crate::monitor::MonitorView;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub event_id: EventId,
    pub quoted_total_satoshi: Satoshi,
}

fn parse_event_id(raw: &str) -> Result<EventId, AppError> {
    EventId::from_str(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Submit a funding request and start watching its deposit.
pub async fn post_funding(
    State(state): State<AppState>,
    body: Result<Json<FundingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let Json(request) = body?;
    let submitted = state.funding.submit(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            event_id: submitted.event_id,
            quoted_total_satoshi: submitted.quote.total_satoshi,
        }),
    ))
}

/// Latest monitor view for an event.
pub async fn get_funding(
    Path(event_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MonitorView>, AppError> {
    let event_id = parse_event_id(&event_id)?;
    state
        .funding
        .monitor_view(&event_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no monitor for event {}", event_id)))
}

/// Start or restart monitoring for an existing event.
pub async fn start_monitor(
    Path(event_id): Path<String>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<MonitorView>), AppError> {
    let event_id = parse_event_id(&event_id)?;
    let view = state.funding.start_monitor(event_id).await?;
    Ok((StatusCode::ACCEPTED, Json(view)))
}

pub async fn stop_monitor(
    Path(event_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let event_id = parse_event_id(&event_id)?;
    match state.funding.stop_monitor(&event_id).await {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(AppError::NotFound(format!(
            "no monitor for event {}",
            event_id
        ))),
    }
}
