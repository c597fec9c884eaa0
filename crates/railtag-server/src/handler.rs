use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use railtag_ledger::{LedgerService, NewComponent, NewReport, ScanRequest, StatusChange};
use railtag_store::{ComponentFilter, PageOf, PageRequest};
use railtag_types::{
    AuditEntry, Component, ComponentId, ComponentStatus, ComponentType, DailyAggregate,
    QualityReport, ReportType, ScanEvent, ScanId, Severity,
};

use crate::error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerService>,
}

/// Health check handler.
pub async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.ledger.ping().await?;
    Ok(Json(json!({
        "status": "ok",
        "store": state.ledger.backend_name(),
    })))
}

/// Info handler.
pub async fn info() -> Json<serde_json::Value> {
    Json(json!({
        "name": "railtag-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /qr/:code/decode`
pub async fn decode(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Component>, ApiError> {
    Ok(Json(state.ledger.decode(&code).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanBody {
    pub qr_code: String,
    pub scanned_by: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub device_info: BTreeMap<String, String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub scan_id: ScanId,
    pub component: Component,
    pub synthesized: bool,
    pub processing_time_ms: u64,
}

/// `POST /qr/scan`
pub async fn scan(
    State(state): State<AppState>,
    Json(body): Json<ScanBody>,
) -> Result<Json<ScanResponse>, ApiError> {
    let outcome = state
        .ledger
        .scan(ScanRequest {
            qr_code: body.qr_code,
            scanned_by: body.scanned_by,
            location: body.location,
            device_info: body.device_info,
            latitude: body.latitude,
            longitude: body.longitude,
        })
        .await?;
    Ok(Json(ScanResponse {
        scan_id: outcome.scan_id,
        component: outcome.component,
        synthesized: outcome.synthesized,
        processing_time_ms: outcome.processing_time_ms,
    }))
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub component_type: ComponentType,
    pub manufacturer: String,
    pub batch_number: String,
    #[serde(default)]
    pub manufacturing_date: Option<NaiveDate>,
    #[serde(default)]
    pub installation_date: Option<NaiveDate>,
    #[serde(default)]
    pub track_section: Option<String>,
    #[serde(default)]
    pub km_post: Option<f64>,
    #[serde(default)]
    pub warranty_months: Option<u32>,
}

/// `POST /qr/generate`
pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<(StatusCode, Json<Component>), ApiError> {
    let component = state
        .ledger
        .generate(NewComponent {
            component_type: body.component_type,
            manufacturer: body.manufacturer,
            batch_number: body.batch_number,
            manufacturing_date: body.manufacturing_date,
            installation_date: body.installation_date,
            track_section: body.track_section,
            km_post: body.km_post,
            warranty_months: body.warranty_months,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(component)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub component_type: Option<ComponentType>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub status: Option<ComponentStatus>,
    #[serde(default)]
    pub search: Option<String>,
}

/// `GET /components`
pub async fn list_components(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PageOf<Component>>, ApiError> {
    let filter = ComponentFilter {
        component_type: query.component_type,
        manufacturer: query.manufacturer,
        status: query.status,
        search: query.search,
    };
    let page = PageRequest::new(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(PageRequest::DEFAULT_LIMIT),
    );
    Ok(Json(state.ledger.list(&filter, page).await?))
}

/// `GET /components/:id`
pub async fn get_component(
    State(state): State<AppState>,
    Path(id): Path<ComponentId>,
) -> Result<Json<Component>, ApiError> {
    Ok(Json(state.ledger.component(&id).await?))
}

/// `GET /components/:id/scans`
pub async fn component_scans(
    State(state): State<AppState>,
    Path(id): Path<ComponentId>,
) -> Result<Json<Vec<ScanEvent>>, ApiError> {
    Ok(Json(state.ledger.scan_history(&id).await?))
}

/// `GET /components/:id/audit`
pub async fn component_audit(
    State(state): State<AppState>,
    Path(id): Path<ComponentId>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    Ok(Json(state.ledger.audit_trail(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: ComponentStatus,
    pub actor: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `POST /components/:id/status`
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<ComponentId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Component>, ApiError> {
    let component = state
        .ledger
        .update_status(
            &id,
            StatusChange {
                target: body.status,
                actor: body.actor,
                notes: body.notes,
            },
        )
        .await?;
    Ok(Json(component))
}

#[derive(Debug, Deserialize)]
pub struct ReportBody {
    pub component_id: ComponentId,
    pub report_type: ReportType,
    pub severity: Severity,
    pub description: String,
    pub reported_by: String,
    #[serde(default)]
    pub estimated_cost: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub report: QualityReport,
    pub status_forced: bool,
    pub previous_status: ComponentStatus,
    pub new_status: ComponentStatus,
}

/// `POST /quality-reports`
pub async fn file_report(
    State(state): State<AppState>,
    Json(body): Json<ReportBody>,
) -> Result<(StatusCode, Json<ReportResponse>), ApiError> {
    let outcome = state
        .ledger
        .file_report(NewReport {
            component_id: body.component_id,
            report_type: body.report_type,
            severity: body.severity,
            description: body.description,
            reported_by: body.reported_by,
            estimated_cost: body.estimated_cost,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ReportResponse {
            report: outcome.report,
            status_forced: outcome.status_forced,
            previous_status: outcome.previous_status,
            new_status: outcome.new_status,
        }),
    ))
}

/// `GET /stats/daily/:date`
pub async fn daily_stats(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DailyAggregate>, ApiError> {
    Ok(Json(state.ledger.daily_stats(date).await?))
}
