use axum::http::StatusCode;
use fundwatch::api::{self, AppState};
use fundwatch::datasource::MockDataSource;
use fundwatch::db::init_db;
use fundwatch::domain::{Percentage, Satoshi, SystemParameters};
use fundwatch::engine::{Clock, SystemClock};
use fundwatch::{FundingService, ParameterCache, Repository};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;

async fn setup_test_app(datasource: MockDataSource) -> (axum::Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let datasource = Arc::new(datasource);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let params = Arc::new(ParameterCache::new(
        datasource.clone(),
        clock.clone(),
        Duration::from_secs(300),
    ));
    // Stands in for the background refresher's first tick.
    params.refresh().await.ok();
    let funding = Arc::new(FundingService::new(datasource, clock, params, repo));
    let state = AppState::new(funding);

    (api::create_router(state), temp_dir)
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _temp) = setup_test_app(MockDataSource::new()).await;

    let (status, body) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint_before_parameters_load() {
    let (app, _temp) = setup_test_app(MockDataSource::new()).await;

    let (status, body) = get_json(app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["pricingAvailable"], false);
    assert_eq!(body["paramsStale"], true);
    assert!(body["paramsFetchedAt"].is_null());
    assert_eq!(body["activeMonitors"], 0);
}

#[tokio::test]
async fn test_params_unavailable_is_503() {
    let (app, _temp) = setup_test_app(MockDataSource::new()).await;

    let (status, body) = get_json(app, "/v1/params").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));
}

#[tokio::test]
async fn test_params_served_once_available() {
    let params = SystemParameters {
        free_hours: 24,
        satoshi_per_duration_hour: Satoshi::new(100),
        min_reward_amount_satoshi: Satoshi::new(2000),
        platform_fee_percentage: Percentage::from_whole(10),
        satoshi_per_extra_winner: Satoshi::new(500),
        dust_threshold_satoshi: Satoshi::new(546),
    };
    let (app, _temp) = setup_test_app(MockDataSource::new().with_parameters(params)).await;

    let (status, body) = get_json(app.clone(), "/v1/params").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["free_hours"], 24);
    assert_eq!(body["dust_threshold_satoshi"], 546);

    let (_, ready) = get_json(app, "/ready").await;
    assert_eq!(ready["pricingAvailable"], true);
    assert_eq!(ready["paramsStale"], false);
    assert!(ready["paramsFetchedAt"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _temp) = setup_test_app(MockDataSource::new()).await;

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/v1/nope")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
