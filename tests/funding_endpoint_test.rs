use axum::http::StatusCode;
use chrono::{Duration as ChronoDuration, Utc};
use fundwatch::api;
use fundwatch::datasource::{DataSourceError, MockDataSource};
use fundwatch::db::init_db;
use fundwatch::domain::{DepositSnapshot, DepositStatus, Percentage, Satoshi, SystemParameters};
use fundwatch::engine::{Clock, SystemClock};
use fundwatch::{FundingService, ParameterCache, Repository};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    datasource: Arc<MockDataSource>,
    _temp: TempDir,
}

fn params() -> SystemParameters {
    SystemParameters {
        free_hours: 24,
        satoshi_per_duration_hour: Satoshi::new(100),
        min_reward_amount_satoshi: Satoshi::new(2000),
        platform_fee_percentage: Percentage::from_whole(10),
        satoshi_per_extra_winner: Satoshi::new(500),
        dust_threshold_satoshi: Satoshi::new(500),
    }
}

fn pending_snapshot() -> DepositSnapshot {
    DepositSnapshot {
        deposit_address: "bc1qendpoint".to_string(),
        expected_amount_satoshi: Satoshi::new(5000),
        received_amount_satoshi: Satoshi::ZERO,
        status: DepositStatus::Pending,
        initial_timeout_at: Utc::now() + ChronoDuration::minutes(30),
    }
}

async fn setup_test_app(datasource: MockDataSource) -> TestApp {
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
    let funding = Arc::new(
        FundingService::new(datasource.clone(), clock, params, repo)
            .with_intervals(Duration::from_secs(3600), Duration::from_secs(3600)),
    );
    let app = api::create_router(api::AppState::new(funding));

    TestApp {
        app,
        datasource,
        _temp: temp_dir,
    }
}

async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_quote_rewarded_event() {
    let test_app = setup_test_app(MockDataSource::new().with_parameters(params())).await;

    let (status, body) = request(
        test_app.app,
        "POST",
        "/v1/quote",
        Some(json!({
            "durationHours": 50,
            "isRewarded": true,
            "rewardSatoshi": 6000,
            "enablePreheat": true,
            "preheatHours": 720
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "priced");
    assert_eq!(body["minimumRewardSatoshi"], 5000);
    assert_eq!(body["rewardSatoshi"], 6000);
    assert_eq!(body["platformFeeSatoshi"], 0);
    // 720h * 100 sats * 10% at the full multiplier.
    assert_eq!(body["preheatFeeSatoshi"], 7200);
    assert_eq!(body["totalSatoshi"], 13200);
    assert_eq!(body["maxRecipients"], 12);
}

#[tokio::test]
async fn test_quote_free_duration_has_no_platform_fee() {
    let test_app = setup_test_app(MockDataSource::new().with_parameters(params())).await;

    let (status, body) = request(
        test_app.app,
        "POST",
        "/v1/quote",
        Some(json!({"durationHours": 10, "isRewarded": false})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "priced");
    assert_eq!(body["platformFeeSatoshi"], 0);
    assert_eq!(body["totalSatoshi"], 0);
}

#[tokio::test]
async fn test_quote_pricing_unavailable() {
    let test_app = setup_test_app(MockDataSource::new()).await;

    let (status, body) = request(
        test_app.app,
        "POST",
        "/v1/quote",
        Some(json!({"durationHours": 10, "isRewarded": false})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pricingUnavailable");
}

#[tokio::test]
async fn test_negative_fee_parameters_never_price() {
    let mut bad = params();
    bad.free_hours = 0;
    bad.platform_fee_percentage = "-5".parse().unwrap();
    let test_app = setup_test_app(MockDataSource::new().with_parameters(bad)).await;

    let (status, body) = request(
        test_app.app.clone(),
        "POST",
        "/v1/quote",
        Some(json!({"durationHours": 10, "isRewarded": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pricingUnavailable");

    let (status, _) = request(
        test_app.app,
        "POST",
        "/v1/funding",
        Some(json!({"durationHours": 10, "isRewarded": false})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(test_app.datasource.created().await.is_empty());
}

#[tokio::test]
async fn test_quote_validation_errors_are_400() {
    let test_app = setup_test_app(MockDataSource::new().with_parameters(params())).await;

    for body in [
        json!({"durationHours": 0, "isRewarded": false}),
        json!({"durationHours": 10, "isRewarded": true}),
        json!({"durationHours": 10, "isRewarded": false, "enablePreheat": true}),
        json!({"durationHours": 10, "isRewarded": false, "enablePreheat": true, "preheatHours": 721}),
        json!({"durationHours": 50, "isRewarded": true, "rewardSatoshi": 4999}),
    ] {
        let (status, resp) = request(test_app.app.clone(), "POST", "/v1/quote", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", resp);
        assert!(resp["error"].is_string());
    }
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let test_app = setup_test_app(MockDataSource::new().with_parameters(params())).await;

    let (status, body) = request(
        test_app.app,
        "POST",
        "/v1/quote",
        Some(json!({"durationHours": "ten"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_submit_creates_records_and_monitors() {
    let test_app = setup_test_app(
        MockDataSource::new()
            .with_parameters(params())
            .with_default_snapshot(pending_snapshot()),
    )
    .await;

    let (status, body) = request(
        test_app.app.clone(),
        "POST",
        "/v1/funding",
        Some(json!({"durationHours": 50, "isRewarded": true, "rewardSatoshi": 5000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quotedTotalSatoshi"], 5000);
    let event_id = body["eventId"].as_str().unwrap().to_string();

    let created = test_app.datasource.created().await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0.as_str(), event_id);

    let (status, submissions) =
        request(test_app.app.clone(), "GET", "/v1/submissions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submissions.as_array().unwrap().len(), 1);
    assert_eq!(submissions[0]["eventId"], event_id.as_str());

    let uri = format!("/v1/funding/{}", event_id);
    let (status, view) = request(test_app.app.clone(), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["eventId"], event_id.as_str());
    assert_eq!(view["outcome"], "PENDING");

    let monitor_uri = format!("/v1/funding/{}/monitor", event_id);
    let (status, _) = request(test_app.app.clone(), "DELETE", &monitor_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(test_app.app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_without_parameters_is_503() {
    let test_app = setup_test_app(MockDataSource::new()).await;

    let (status, body) = request(
        test_app.app,
        "POST",
        "/v1/funding",
        Some(json!({"durationHours": 10, "isRewarded": false})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
    assert!(test_app.datasource.created().await.is_empty());
}

#[tokio::test]
async fn test_submit_rejected_by_event_service_is_502() {
    let test_app = setup_test_app(
        MockDataSource::new()
            .with_parameters(params())
            .with_create_error(DataSourceError::Rejected("event service offline".to_string())),
    )
    .await;

    let (status, body) = request(
        test_app.app,
        "POST",
        "/v1/funding",
        Some(json!({"durationHours": 10, "isRewarded": false})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("event service offline"));
}

#[tokio::test]
async fn test_start_monitor_for_existing_event() {
    let test_app = setup_test_app(
        MockDataSource::new()
            .with_parameters(params())
            .with_default_snapshot(pending_snapshot()),
    )
    .await;

    let (status, view) = request(
        test_app.app.clone(),
        "POST",
        "/v1/funding/evt-existing/monitor",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(view["eventId"], "evt-existing");

    let (status, _) = request(test_app.app, "GET", "/v1/funding/evt-existing", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_monitor_is_404() {
    let test_app = setup_test_app(MockDataSource::new().with_parameters(params())).await;

    let (status, _) = request(test_app.app.clone(), "GET", "/v1/funding/evt-none", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        test_app.app,
        "DELETE",
        "/v1/funding/evt-none/monitor",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submissions_limit_validated() {
    let test_app = setup_test_app(MockDataSource::new()).await;

    let (status, _) = request(test_app.app.clone(), "GET", "/v1/submissions?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = request(test_app.app, "GET", "/v1/submissions?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
