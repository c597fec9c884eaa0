use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use railtag_types::{
    AuditEntry, Component, ComponentId, ComponentStatus, ComponentType, DailyAggregate,
    QualityReport, ScanEvent,
};

use crate::error::StoreResult;

/// Filters for component listing. All present filters must match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComponentFilter {
    pub component_type: Option<ComponentType>,
    /// Exact manufacturer name, case-insensitive.
    pub manufacturer: Option<String>,
    pub status: Option<ComponentStatus>,
    /// Case-insensitive substring over qr_code, batch_number, manufacturer,
    /// and track_section.
    pub search: Option<String>,
}

/// A 1-based page request. Limits are clamped to [1, MAX_LIMIT].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_LIMIT)
    }
}

/// One page of results plus the unpaginated total.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageOf<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Result of filing a quality report: the stored report plus whether it
/// forced a lifecycle transition on the referenced component.
#[derive(Clone, Debug)]
pub struct ReportOutcome {
    pub report: QualityReport,
    pub status_forced: bool,
    pub previous_status: ComponentStatus,
    pub new_status: ComponentStatus,
}

/// Storage boundary for the Ledger Service.
///
/// Two implementations exist — durable ([`crate::SqliteStore`]) and
/// in-memory fallback ([`crate::MemoryStore`]) — and they must be
/// behaviorally indistinguishable to callers. The consistency contract:
///
/// - `increment_scan_and_record` is a single atomic unit: counter bump,
///   scan-event append, and daily-aggregate upsert all commit or none do.
///   Increments on the same component are serialized; increments on
///   different components proceed independently.
/// - `create_quality_report` evaluates the forced lifecycle transition for
///   Critical severity inside the same atomic unit as the report insert,
///   under the same per-component serialization as scans.
/// - Orphan scans are always recordable; the scan ledger never drops an
///   observation.
/// - Lock and transaction waits are bounded; expiry surfaces as
///   [`crate::StoreError::Timeout`], which is safe to retry.
#[async_trait]
pub trait ComponentStore: Send + Sync {
    /// Backend label, for logging and health reporting only. Callers must
    /// never branch on it.
    fn backend_name(&self) -> &'static str;

    /// Cheap liveness probe.
    async fn ping(&self) -> StoreResult<()>;

    /// Persist a new component. Rejects duplicate ids and QR codes; a
    /// synthesized component additionally gets a `Synthesized` audit entry
    /// in the same unit.
    async fn create_component(&self, component: &Component) -> StoreResult<()>;

    async fn component_by_id(&self, id: &ComponentId) -> StoreResult<Option<Component>>;

    /// Exact-match lookup by QR code.
    async fn component_by_qr(&self, qr_code: &str) -> StoreResult<Option<Component>>;

    async fn list_components(
        &self,
        filter: &ComponentFilter,
        page: PageRequest,
    ) -> StoreResult<PageOf<Component>>;

    /// Atomically advance `scan_count`/`last_scanned` and append the scan
    /// event. Returns the component as updated.
    async fn increment_scan_and_record(
        &self,
        component_id: &ComponentId,
        event: &ScanEvent,
    ) -> StoreResult<Component>;

    /// Append a scan event that resolved to no component.
    async fn record_orphan_scan(&self, event: &ScanEvent) -> StoreResult<()>;

    /// File a quality report, applying the forced `Damaged` transition for
    /// Critical severity inside the same atomic unit.
    async fn create_quality_report(&self, report: &QualityReport) -> StoreResult<ReportOutcome>;

    /// Administrative status update. Validates the transition against the
    /// lifecycle state machine and writes the audit entry atomically.
    async fn update_status(
        &self,
        component_id: &ComponentId,
        target: ComponentStatus,
        actor: &str,
        notes: Option<&str>,
    ) -> StoreResult<Component>;

    /// Scan events for one component, oldest first.
    async fn scan_history(&self, component_id: &ComponentId) -> StoreResult<Vec<ScanEvent>>;

    /// Audit entries for one component, oldest first.
    async fn audit_trail(&self, component_id: &ComponentId) -> StoreResult<Vec<AuditEntry>>;

    /// Rollup for one calendar day; zeros when no activity was recorded.
    async fn daily_aggregate(&self, date: NaiveDate) -> StoreResult<DailyAggregate>;

    /// Delete a component and everything that belongs to it (scan events,
    /// reports, audit entries). Not expected in normal operation. Returns
    /// `true` if the component existed.
    async fn purge_component(&self, component_id: &ComponentId) -> StoreResult<bool>;
}
