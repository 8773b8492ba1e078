use axum::extract::State;
use axum::Json;

use crate::api::AppState;
use crate::domain::SystemParameters;
use crate::error::AppError;

/// Current pricing parameters. 503 while none could be fetched.
pub async fn get_params(State(state): State<AppState>) -> Result<Json<SystemParameters>, AppError> {
    state
        .params
        .current()
        .await
        .map(Json)
        .ok_or_else(|| AppError::Unavailable("pricing parameters are unavailable".into()))
}
