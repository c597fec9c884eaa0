use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::OwnedMutexGuard;
use tokio::time::timeout;

use railtag_types::{
    next_status, AuditEntry, Component, ComponentId, ComponentOrigin, ComponentStatus,
    DailyAggregate, QualityReport, ScanEvent, StatusTrigger,
};

use crate::error::{StoreError, StoreResult};
use crate::traits::{ComponentFilter, ComponentStore, PageOf, PageRequest, ReportOutcome};

/// In-memory fallback store.
///
/// Exists for demo/offline continuity when the durable store is
/// unreachable; correctness over throughput. Table state lives behind one
/// `RwLock`, held only for the duration of a map operation. Read-modify-write
/// sequences (scan increments, report filings, status updates) are
/// serialized per component by an async mutex with bounded acquisition, so
/// two simultaneous scans of one physical part can never lose an increment
/// while scans of different components never wait on each other's lock.
pub struct MemoryStore {
    state: RwLock<State>,
    locks: Mutex<HashMap<ComponentId, Arc<tokio::sync::Mutex<()>>>>,
    lock_timeout: Duration,
}

#[derive(Default)]
struct State {
    components: HashMap<ComponentId, Component>,
    qr_index: HashMap<String, ComponentId>,
    scans: Vec<ScanEvent>,
    reports: Vec<QualityReport>,
    audits: Vec<AuditEntry>,
    daily: BTreeMap<NaiveDate, DailyAggregate>,
}

impl MemoryStore {
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new() -> Self {
        Self::with_lock_timeout(Self::DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(State::default()),
            locks: Mutex::new(HashMap::new()),
            lock_timeout,
        }
    }

    /// Acquire the per-component mutex within the bounded window.
    async fn serialize_component(
        &self,
        component_id: &ComponentId,
    ) -> StoreResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().expect("lock poisoned");
            Arc::clone(locks.entry(*component_id).or_default())
        };
        timeout(self.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                StoreError::Timeout(format!(
                    "component lock for {component_id} not acquired within {:?}",
                    self.lock_timeout
                ))
            })
    }

    fn matches(filter: &ComponentFilter, component: &Component) -> bool {
        if let Some(ct) = filter.component_type {
            if component.component_type != ct {
                return false;
            }
        }
        if let Some(status) = filter.status {
            if component.status != status {
                return false;
            }
        }
        if let Some(manufacturer) = &filter.manufacturer {
            if !component.manufacturer.eq_ignore_ascii_case(manufacturer) {
                return false;
            }
        }
        if let Some(search) = &filter.search {
            let needle = search.to_lowercase();
            let haystacks = [
                Some(component.qr_code.as_str().to_lowercase()),
                Some(component.batch_number.to_lowercase()),
                Some(component.manufacturer.to_lowercase()),
                component.track_section.as_ref().map(|s| s.to_lowercase()),
            ];
            if !haystacks
                .iter()
                .flatten()
                .any(|h| h.contains(&needle))
            {
                return false;
            }
        }
        true
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().expect("lock poisoned");
        f.debug_struct("MemoryStore")
            .field("components", &state.components.len())
            .field("scans", &state.scans.len())
            .field("reports", &state.reports.len())
            .finish()
    }
}

#[async_trait]
impl ComponentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_component(&self, component: &Component) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        if state.qr_index.contains_key(component.qr_code.as_str()) {
            return Err(StoreError::DuplicateQrCode(
                component.qr_code.as_str().to_string(),
            ));
        }
        if state.components.contains_key(&component.component_id) {
            return Err(StoreError::DuplicateComponentId(
                component.component_id.to_string(),
            ));
        }

        state
            .qr_index
            .insert(component.qr_code.as_str().to_string(), component.component_id);
        state
            .components
            .insert(component.component_id, component.clone());
        if component.origin == ComponentOrigin::Synthesized {
            state.audits.push(AuditEntry::synthesized(
                component.component_id,
                component.qr_code.as_str(),
                "ledger",
            ));
        }
        let date = component.created_at.date_naive();
        state
            .daily
            .entry(date)
            .or_insert_with(|| DailyAggregate::empty(date))
            .note_component();
        Ok(())
    }

    async fn component_by_id(&self, id: &ComponentId) -> StoreResult<Option<Component>> {
        let state = self.state.read().expect("lock poisoned");
        Ok(state.components.get(id).cloned())
    }

    async fn component_by_qr(&self, qr_code: &str) -> StoreResult<Option<Component>> {
        let state = self.state.read().expect("lock poisoned");
        Ok(state
            .qr_index
            .get(qr_code)
            .and_then(|id| state.components.get(id))
            .cloned())
    }

    async fn list_components(
        &self,
        filter: &ComponentFilter,
        page: PageRequest,
    ) -> StoreResult<PageOf<Component>> {
        let state = self.state.read().expect("lock poisoned");
        let mut matched: Vec<Component> = state
            .components
            .values()
            .filter(|c| Self::matches(filter, c))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.component_id.cmp(&b.component_id))
        });

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok(PageOf {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    async fn increment_scan_and_record(
        &self,
        component_id: &ComponentId,
        event: &ScanEvent,
    ) -> StoreResult<Component> {
        let _guard = self.serialize_component(component_id).await?;
        let mut state = self.state.write().expect("lock poisoned");

        let updated = {
            let component = state
                .components
                .get_mut(component_id)
                .ok_or_else(|| StoreError::ComponentNotFound(component_id.to_string()))?;
            component.note_scan(event.scan_timestamp);
            component.clone()
        };

        state.scans.push(event.clone());
        let date = event.scan_timestamp.date_naive();
        state
            .daily
            .entry(date)
            .or_insert_with(|| DailyAggregate::empty(date))
            .note_scan(false);
        Ok(updated)
    }

    async fn record_orphan_scan(&self, event: &ScanEvent) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        state.scans.push(event.clone());
        let date = event.scan_timestamp.date_naive();
        state
            .daily
            .entry(date)
            .or_insert_with(|| DailyAggregate::empty(date))
            .note_scan(true);
        Ok(())
    }

    async fn create_quality_report(&self, report: &QualityReport) -> StoreResult<ReportOutcome> {
        let _guard = self.serialize_component(&report.component_id).await?;
        let mut state = self.state.write().expect("lock poisoned");

        let (previous_status, new_status, status_forced) = {
            let component = state
                .components
                .get_mut(&report.component_id)
                .ok_or_else(|| StoreError::ComponentNotFound(report.component_id.to_string()))?;
            let previous = component.status;
            if report.severity.forces_damaged() {
                let next = next_status(previous, StatusTrigger::CriticalReport)?;
                if next != previous {
                    component.apply_status(next);
                    (previous, next, true)
                } else {
                    (previous, previous, false)
                }
            } else {
                (previous, previous, false)
            }
        };

        if status_forced {
            state.audits.push(AuditEntry::status_changed(
                report.component_id,
                previous_status,
                new_status,
                report.reported_by.clone(),
                Some(format!("forced by critical report {}", report.report_id)),
            ));
        }
        state.audits.push(AuditEntry::report_filed(
            report.component_id,
            report.report_id,
            report.priority,
            report.reported_by.clone(),
        ));
        state.reports.push(report.clone());
        let date = report.report_date.date_naive();
        state
            .daily
            .entry(date)
            .or_insert_with(|| DailyAggregate::empty(date))
            .note_report();

        Ok(ReportOutcome {
            report: report.clone(),
            status_forced,
            previous_status,
            new_status,
        })
    }

    async fn update_status(
        &self,
        component_id: &ComponentId,
        target: ComponentStatus,
        actor: &str,
        notes: Option<&str>,
    ) -> StoreResult<Component> {
        let _guard = self.serialize_component(component_id).await?;
        let mut state = self.state.write().expect("lock poisoned");

        let (previous, updated) = {
            let component = state
                .components
                .get_mut(component_id)
                .ok_or_else(|| StoreError::ComponentNotFound(component_id.to_string()))?;
            let previous = component.status;
            let next = next_status(previous, StatusTrigger::Administrative { target })?;
            component.apply_status(next);
            (previous, component.clone())
        };

        state.audits.push(AuditEntry::status_changed(
            *component_id,
            previous,
            updated.status,
            actor,
            notes.map(str::to_string),
        ));
        Ok(updated)
    }

    async fn scan_history(&self, component_id: &ComponentId) -> StoreResult<Vec<ScanEvent>> {
        let state = self.state.read().expect("lock poisoned");
        Ok(state
            .scans
            .iter()
            .filter(|s| s.component_id.as_ref() == Some(component_id))
            .cloned()
            .collect())
    }

    async fn audit_trail(&self, component_id: &ComponentId) -> StoreResult<Vec<AuditEntry>> {
        let state = self.state.read().expect("lock poisoned");
        Ok(state
            .audits
            .iter()
            .filter(|a| a.component_id == *component_id)
            .cloned()
            .collect())
    }

    async fn daily_aggregate(&self, date: NaiveDate) -> StoreResult<DailyAggregate> {
        let state = self.state.read().expect("lock poisoned");
        Ok(state
            .daily
            .get(&date)
            .cloned()
            .unwrap_or_else(|| DailyAggregate::empty(date)))
    }

    async fn purge_component(&self, component_id: &ComponentId) -> StoreResult<bool> {
        let _guard = self.serialize_component(component_id).await?;
        let mut state = self.state.write().expect("lock poisoned");
        let Some(component) = state.components.remove(component_id) else {
            return Ok(false);
        };
        state.qr_index.remove(component.qr_code.as_str());
        state
            .scans
            .retain(|s| s.component_id.as_ref() != Some(component_id));
        state.reports.retain(|r| r.component_id != *component_id);
        state.audits.retain(|a| a.component_id != *component_id);
        drop(state);
        // The lock entry goes with the row; an in-flight guard keeps its
        // mutex alive until dropped.
        self.locks
            .lock()
            .expect("lock poisoned")
            .remove(component_id);
        Ok(true)
    }
}
