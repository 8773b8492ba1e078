use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::AppState;
use crate::domain::Submission;
use crate::error::AppError;

const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionsQuery {
    pub limit: Option<u32>,
}

/// Submissions recorded by this service, newest first.
pub async fn get_submissions(
    Query(params): Query<SubmissionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Submission>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    let submissions = state.funding.submissions(limit).await?;
    Ok(Json(submissions))
}
