use axum::body::Body;
use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use siteguard::api::{build_router, AppState};
use siteguard::config::AppConfig;
use siteguard::db::Database;

fn create_test_state() -> AppState {
    let db = Database::in_memory().unwrap();
    let mut config = AppConfig::default();
    // Point every outbound dependency at a closed local port so background
    // scan tasks fail fast instead of reaching the network
    config.llm.base_url = Some("http://127.0.0.1:9".to_string());
    config.llm.batch_delay_ms = 0;
    config.scanner.workdir_root = std::env::temp_dir().join("siteguard-api-tests");
    AppState { db, config: Arc::new(config) }
}

fn app(state: &AppState) -> axum::Router {
    build_router(state.clone())
}

fn make_request(method: &str, uri: &str, body: Option<Value>) -> axum::http::Request<Body> {
    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    match body {
        Some(b) => builder.body(Body::from(serde_json::to_string(&b).unwrap())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(response: axum::http::Response<Body>) -> Value {
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        panic!("Empty response body. Status: {}, Headers: {:?}", parts.status, parts.headers);
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("JSON parse error: {}. Body: {:?}", e, String::from_utf8_lossy(&bytes)))
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = create_test_state();
    let req = make_request("GET", "/api/health", None);
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "siteguard");
}

#[tokio::test]
async fn test_create_scan_requires_a_target() {
    let state = create_test_state();
    let req = make_request("POST", "/api/scans", Some(json!({})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_and_get_scan() {
    let state = create_test_state();

    let req = make_request("POST", "/api/scans", Some(json!({
        "target_url": "http://127.0.0.1:1/",
        "user_id": "user-api"
    })));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(response).await;
    let scan_id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["status"], "queued");
    assert_eq!(body["target"], "http://127.0.0.1:1/");

    // The scan runs in the background, so only identity fields are stable
    let req = make_request("GET", &format!("/api/scans/{}", scan_id), None);
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["id"], scan_id);
    assert_eq!(body["target_url"], "http://127.0.0.1:1/");
    assert_eq!(body["user_id"], "user-api");
}

#[tokio::test]
async fn test_get_missing_scan_is_404() {
    let state = create_test_state();
    let req = make_request("GET", "/api/scans/no-such-scan", None);
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_scans() {
    let state = create_test_state();

    for target in ["http://127.0.0.1:1/a", "http://127.0.0.1:1/b"] {
        let req = make_request("POST", "/api/scans", Some(json!({ "target_url": target })));
        let response = app(&state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let req = make_request("GET", "/api/scans", None);
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["scans"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_findings_of_missing_scan_is_404() {
    let state = create_test_state();
    let req = make_request("GET", "/api/scans/no-such-scan/findings", None);
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_finding_status_validation() {
    let state = create_test_state();

    let req = make_request("POST", "/api/findings/f-1/status", Some(json!({"status": "bogus"})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let req = make_request("POST", "/api/findings/f-1/status", Some(json!({"status": "fixed"})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
