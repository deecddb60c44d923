use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use crate::api::models::UpdateFindingStatusRequest;
use crate::api::AppState;
use crate::models::FindingStatus;

/// The dashboard records user triage decisions here; the core only persists
/// them.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateFindingStatusRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(status) = FindingStatus::from_str(&req.status) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("Unknown finding status: {}", req.status)})),
        ));
    };

    match state.db.update_finding_status(&id, status) {
        Ok(true) => Ok(Json(json!({"id": id, "status": status.as_str()}))),
        Ok(false) => Err((StatusCode::NOT_FOUND, Json(json!({"error": "Finding not found"})))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )),
    }
}
