pub mod funding;
pub mod health;
pub mod params;
pub mod quote;
pub mod submissions;

use crate::orchestration::{FundingService, ParameterCache};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub funding: Arc<FundingService>,
    pub params: Arc<ParameterCache>,
}

impl AppState {
    pub fn new(funding: Arc<FundingService>) -> Self {
        let params = funding.parameters().clone();
        Self { funding, params }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/params", get(params::get_params))
        .route("/v1/quote", post(quote::post_quote))
        .route("/v1/funding", post(funding::post_funding))
        .route("/v1/funding/:event_id", get(funding::get_funding))
        .route(
            "/v1/funding/:event_id/monitor",
            post(funding::start_monitor).delete(funding::stop_monitor),
        )
        .route("/v1/submissions", get(submissions::get_submissions))
        .layer(cors)
        .with_state(state)
}
