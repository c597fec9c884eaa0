use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all Railtag endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health))
        .route("/v1/info", get(handler::info))
        .route("/qr/:code/decode", get(handler::decode))
        .route("/qr/scan", post(handler::scan))
        .route("/qr/generate", post(handler::generate))
        .route("/components", get(handler::list_components))
        .route("/components/:id", get(handler::get_component))
        .route("/components/:id/scans", get(handler::component_scans))
        .route("/components/:id/audit", get(handler::component_audit))
        .route("/components/:id/status", post(handler::update_status))
        .route("/quality-reports", post(handler::file_report))
        .route("/stats/daily/:date", get(handler::daily_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
