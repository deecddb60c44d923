pub mod models;
pub mod routes;

use std::sync::Arc;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::config::AppConfig;
use crate::db::Database;
use crate::errors::SiteguardError;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
}

pub fn create_app_state(config: AppConfig) -> Result<AppState, SiteguardError> {
    let db = Database::new(&config.server.db_path)?;
    Ok(AppState { db, config: Arc::new(config) })
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", axum::routing::get(routes::health::health_check))
        .route("/api/scans", axum::routing::post(routes::scans::create_scan).get(routes::scans::list_scans))
        .route("/api/scans/:id", axum::routing::get(routes::scans::get_scan))
        .route("/api/scans/:id/findings", axum::routing::get(routes::scans::get_findings))
        .route("/api/findings/:id/status", axum::routing::post(routes::findings::update_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
