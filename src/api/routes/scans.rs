use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use crate::api::models::{CreateScanRequest, ListQuery};
use crate::api::AppState;
use crate::pipeline::{ScanRequest, ScanRunner};
use tracing::error;

/// Create a scan and kick off the pipeline in the background. The response
/// carries only the scan id; progress is observed by polling the scan
/// record. That is the contract, not an accident.
pub async fn create_scan(
    State(state): State<AppState>,
    Json(req): Json<CreateScanRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    if req.repo_url.is_none() && req.target_url.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Provide repo_url, target_url, or both"})),
        ));
    }

    let scan_id = uuid::Uuid::new_v4().to_string();
    let user_id = req.user_id.clone().unwrap_or_else(|| "anonymous".to_string());

    state.db.ensure_user(&user_id, None).map_err(internal)?;
    state
        .db
        .create_scan(&scan_id, &user_id, req.repo_url.as_deref(), req.target_url.as_deref())
        .map_err(internal)?;

    let llm = crate::llm::create_provider(&state.config.llm).map_err(internal)?;
    let runner = ScanRunner::new(state.db.clone(), state.config.clone(), Arc::from(llm));
    runner.spawn(ScanRequest {
        scan_id: scan_id.clone(),
        user_id,
        repo_url: req.repo_url.clone(),
        target_url: req.target_url.clone(),
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": scan_id,
            "status": "queued",
            "target": req.target_url.or(req.repo_url),
        })),
    ))
}

pub async fn list_scans(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let limit = query.limit.unwrap_or(20);
    let offset = query.offset.unwrap_or(0);

    let scans = state
        .db
        .list_scans(query.user_id.as_deref(), limit, offset)
        .map_err(internal)?;

    Ok(Json(json!({ "scans": scans, "total": scans.len() })))
}

pub async fn get_scan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.db.get_scan(&id) {
        Ok(Some(scan)) => Ok(Json(scan)),
        Ok(None) => Err((StatusCode::NOT_FOUND, Json(json!({"error": "Scan not found"})))),
        Err(e) => Err(internal(e)),
    }
}

pub async fn get_findings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.db.get_scan(&id) {
        Ok(None) => return Err((StatusCode::NOT_FOUND, Json(json!({"error": "Scan not found"})))),
        Err(e) => return Err(internal(e)),
        Ok(Some(_)) => {}
    }

    let findings = state.db.get_findings(&id).map_err(internal)?;
    let total = findings.len();
    Ok(Json(json!({ "findings": findings, "total": total })))
}

fn internal(e: crate::errors::SiteguardError) -> (StatusCode, Json<Value>) {
    error!(error = %e, "Request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e.to_string()})))
}
