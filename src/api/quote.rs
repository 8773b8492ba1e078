use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::AppState;
use crate::domain::FundingRequest;
use crate::engine::Quote;
use crate::error::AppError;

/// Price a funding request without submitting it.
///
/// Returns `{"status": "pricingUnavailable"}` rather than an error while
/// parameters cannot be fetched, so callers can keep the form editable.
pub async fn post_quote(
    State(state): State<AppState>,
    body: Result<Json<FundingRequest>, JsonRejection>,
) -> Result<Json<Quote>, AppError> {
    let Json(request) = body?;
    let quote = state.funding.quote(&request).await?;
    Ok(Json(quote))
}
