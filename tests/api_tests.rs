//! HTTP surface tests driven through the router without a live socket.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use logvault::config::RetentionConfig;
use logvault::handlers::AppState;
use logvault::server::create_router;
use logvault::store::{Clock, LogLevel, LogRecord, LogStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;

// The Prometheus recorder is process-global and can only be installed once.
static METRICS: OnceLock<Arc<PrometheusHandle>> = OnceLock::new();

fn metrics_handle() -> Arc<PrometheusHandle> {
    METRICS
        .get_or_init(|| Arc::new(logvault::metrics::init_metrics()))
        .clone()
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 4, 10, 30, 0).unwrap()
}

async fn test_app() -> (Router, tempfile::TempDir, Clock) {
    let clock = Clock::fixed(fixed_now());
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("logvault.db").display());
    let store = Arc::new(LogStore::open(&url, clock.clone()).await.unwrap());

    let state = AppState {
        store,
        retention: RetentionConfig {
            keep_days: 3,
            per_application: HashMap::new(),
            maintenance_hour: 3,
            check_interval_secs: 3600,
        },
    };
    (create_router(state, metrics_handle()), dir, clock)
}

fn sample_record(application_path: &str, time_utc: DateTime<Utc>) -> LogRecord {
    LogRecord {
        logger_name: "ApiTestLogger".to_string(),
        log_level: LogLevel::Error,
        time_utc,
        application_path: application_path.to_string(),
        message: Some("api ingestion test".to_string()),
        exception_type: None,
        exception_message: None,
        exception_additional_info: None,
        correlation_id: Some(uuid::Uuid::new_v4().to_string()),
        server: Some("api-test-server".to_string()),
        process_id: Some(1),
        thread_id: Some(2),
        identity: None,
        additional_fields: HashMap::new(),
        performance_data: HashMap::new(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir, _clock) = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ingest_then_search_round_trip() {
    let (app, _dir, clock) = test_app().await;
    let record = sample_record("/apps/api-round-trip", clock.now());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/logs")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&record).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["id"].as_i64().unwrap() >= 1);

    let uri = "/api/logs?application=/apps/api-round-trip&levels=error\
               &from=2026-08-04T10:29:00Z&to=2026-08-04T10:31:00Z";
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["logs"][0]["logger_name"], "ApiTestLogger");
    assert_eq!(body["logs"][0]["log_level"], "error");
}

#[tokio::test]
async fn test_batch_ingest() {
    let (app, _dir, clock) = test_app().await;
    let records = vec![
        sample_record("/apps/api-batch", clock.now()),
        sample_record("/apps/api-batch-other", clock.now()),
    ];

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/logs/batch")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&records).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["ids"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_rejects_unknown_level() {
    let (app, _dir, _clock) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/logs?levels=catastrophic")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "validation_error");
}

#[tokio::test]
async fn test_status_heartbeat_round_trip() {
    let (app, _dir, _clock) = test_app().await;

    let update = serde_json::json!({
        "application_path": "/apps/api-status",
        "server": "SRV1",
        "performance": {
            "cpu": 12.5,
            "memory": 104857600.0,
            "observed_utc": "2026-08-04T10:30:00Z"
        }
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/status")
                .header("content-type", "application/json")
                .body(Body::from(update.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/statuses?since=2026-08-04T10:00:00Z")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let statuses = body.as_array().unwrap();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0]["application_path"], "/apps/api-status");
    assert_eq!(statuses[0]["cpu"], 12.5);
    assert!(statuses[0]["last_error_time_utc"].is_null());
}

#[tokio::test]
async fn test_maintenance_endpoint_reports() {
    let (app, _dir, clock) = test_app().await;

    // Ingest first so maintenance has a table to work on.
    let record = sample_record("/apps/api-maintenance", clock.now());
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/logs")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&record).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/maintenance/run")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["tables_maintained"], 1);
    assert_eq!(body["partitions_dropped"], 0);
    assert!(body["failed_tables"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint_renders() {
    let (app, _dir, _clock) = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
