use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::AppState;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: &'static str,
    pub pricing_available: bool,
    pub params_fetched_at: Option<DateTime<Utc>>,
    pub params_stale: bool,
    pub active_monitors: usize,
}

/// Readiness: the service is up; pricing may still be unavailable.
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let params_fetched_at = state.params.fetched_at().await;
    Json(ReadyResponse {
        status: "ready",
        pricing_available: params_fetched_at.is_some(),
        params_fetched_at,
        params_stale: state.params.is_stale().await,
        active_monitors: state.funding.active_monitors().await,
    })
}
