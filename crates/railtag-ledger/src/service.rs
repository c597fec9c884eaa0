use std::sync::Arc;
use std::time::{Duration, Instant};

use backon::{ConstantBuilder, Retryable};
use chrono::{NaiveDate, Utc};

use railtag_store::{
    ComponentFilter, ComponentStore, PageOf, PageRequest, ReportOutcome, StoreError,
};
use railtag_types::{
    derive_priority, AuditEntry, Component, ComponentId, ComponentOrigin, ComponentStatus,
    DailyAggregate, DeviceInfo, QrCode, QrPayload, QualityReport, ReportId, ResolutionStatus,
    ScanEvent, ScanId,
};

use crate::error::{LedgerError, LedgerResult};
use crate::validation::{NewComponent, NewReport, ScanRequest, StatusChange};

/// Tunables for the ledger service.
#[derive(Clone, Copy, Debug)]
pub struct LedgerOptions {
    /// Mint a placeholder component when a well-formed code resolves to
    /// nothing (demo/offline mode).
    pub synthesize_unknown: bool,
    /// Delay before the single internal retry of a transient store failure.
    pub retry_delay: Duration,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            synthesize_unknown: false,
            retry_delay: Duration::from_millis(50),
        }
    }
}

/// Result of a successful scan.
#[derive(Clone, Debug)]
pub struct ScanOutcome {
    pub scan_id: ScanId,
    /// The resolved (or freshly synthesized) component, post-increment.
    pub component: Component,
    pub synthesized: bool,
    pub processing_time_ms: u64,
}

/// The ledger service. All domain operations go through here; the store
/// backend is interchangeable and only ever surfaces in logs.
pub struct LedgerService {
    store: Arc<dyn ComponentStore>,
    options: LedgerOptions,
}

impl LedgerService {
    pub fn new(store: Arc<dyn ComponentStore>) -> Self {
        Self::with_options(store, LedgerOptions::default())
    }

    pub fn with_options(store: Arc<dyn ComponentStore>, options: LedgerOptions) -> Self {
        Self { store, options }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub async fn ping(&self) -> LedgerResult<()> {
        Ok(self.store.ping().await?)
    }

    /// Retry a store operation once if it failed transiently.
    async fn retry_transient<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        op.retry(
            ConstantBuilder::default()
                .with_delay(self.options.retry_delay)
                .with_max_times(1),
        )
        .when(StoreError::is_transient)
        .notify(|err, delay| {
            tracing::warn!(error = %err, ?delay, "transient store error, retrying once");
        })
        .await
    }

    /// Generate a new component with a freshly minted QR code.
    ///
    /// Never retried internally: a duplicate identity is a conflict to
    /// report, not a hiccup to paper over.
    pub async fn generate(&self, input: NewComponent) -> LedgerResult<Component> {
        let input = input.validated()?;
        let qr_code = QrCode::mint(input.component_type, &input.manufacturer, &input.batch_number)
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        let now = Utc::now();
        let component = Component {
            component_id: ComponentId::new(),
            qr_code,
            component_type: input.component_type,
            manufacturer: input.manufacturer,
            batch_number: input.batch_number,
            manufacturing_date: input.manufacturing_date,
            installation_date: input.installation_date,
            track_section: input.track_section,
            km_post: input.km_post,
            warranty_months: input
                .warranty_months
                .unwrap_or_else(|| input.component_type.default_warranty_months()),
            status: ComponentStatus::Active,
            scan_count: 0,
            last_scanned: None,
            origin: ComponentOrigin::Manufactured,
            created_at: now,
            updated_at: now,
        };

        self.store.create_component(&component).await?;
        tracing::info!(
            component_id = %component.component_id,
            qr_code = %component.qr_code,
            component_type = %component.component_type,
            "component generated"
        );
        Ok(component)
    }

    /// Resolve a QR code to its component without recording a scan.
    pub async fn decode(&self, code: &str) -> LedgerResult<Component> {
        let code = code.trim();
        if code.is_empty() {
            return Err(LedgerError::Validation("qr_code must not be empty".into()));
        }
        self.store
            .component_by_qr(code)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("QR code {code}")))
    }

    /// Record one scan observation.
    ///
    /// A recognized code atomically advances the component's counters. An
    /// unrecognized code is still ledgered as an orphan event; depending on
    /// configuration a well-formed unknown code may instead mint a
    /// placeholder component. A blank code records nothing, there being no
    /// observation to keep.
    pub async fn scan(&self, request: ScanRequest) -> LedgerResult<ScanOutcome> {
        let started = Instant::now();
        let (scanned_by, device_info) = request.validated_context()?;
        let code = request.qr_code.trim().to_string();
        if code.is_empty() {
            return Err(LedgerError::Validation("qr_code must not be empty".into()));
        }

        if let Some(component) = self.store.component_by_qr(&code).await? {
            return self
                .record_hit(component, code, scanned_by, device_info, &request, started, false)
                .await;
        }

        match QrPayload::parse(&code) {
            Err(parse_err) => {
                let event = orphan_event(
                    &code,
                    scanned_by,
                    device_info,
                    &request,
                    started,
                    parse_err.to_string(),
                );
                self.retry_transient(|| async { self.store.record_orphan_scan(&event).await })
                    .await?;
                tracing::warn!(qr_code = %code, scan_id = %event.id, "malformed code scanned");
                Err(LedgerError::Validation(format!(
                    "malformed QR code (recorded as scan {}): {parse_err}",
                    event.id
                )))
            }
            Ok(payload) if self.options.synthesize_unknown => {
                let placeholder = synthesize_placeholder(&code, &payload);
                match self.store.create_component(&placeholder).await {
                    Ok(()) => {
                        tracing::info!(
                            component_id = %placeholder.component_id,
                            qr_code = %code,
                            "placeholder component synthesized for unknown code"
                        );
                        self.record_hit(
                            placeholder, code, scanned_by, device_info, &request, started, true,
                        )
                        .await
                    }
                    // Lost a race with a concurrent scan of the same code.
                    Err(StoreError::DuplicateQrCode(_)) => {
                        let component =
                            self.store.component_by_qr(&code).await?.ok_or_else(|| {
                                LedgerError::Internal(format!(
                                    "component for {code} vanished after duplicate-code conflict"
                                ))
                            })?;
                        self.record_hit(
                            component, code, scanned_by, device_info, &request, started, false,
                        )
                        .await
                    }
                    Err(err) => Err(err.into()),
                }
            }
            Ok(_) => {
                let event = orphan_event(
                    &code,
                    scanned_by,
                    device_info,
                    &request,
                    started,
                    "unrecognized QR code".to_string(),
                );
                self.retry_transient(|| async { self.store.record_orphan_scan(&event).await })
                    .await?;
                tracing::warn!(qr_code = %code, scan_id = %event.id, "orphan scan recorded");
                Err(LedgerError::UnknownCode {
                    code,
                    scan_id: event.id,
                })
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_hit(
        &self,
        component: Component,
        code: String,
        scanned_by: String,
        device_info: DeviceInfo,
        request: &ScanRequest,
        started: Instant,
        synthesized: bool,
    ) -> LedgerResult<ScanOutcome> {
        let processing_time_ms = started.elapsed().as_millis() as u64;
        let event = ScanEvent {
            id: ScanId::new(),
            component_id: Some(component.component_id),
            qr_code: code,
            scanned_by,
            location: request.location.clone(),
            device_info,
            latitude: request.latitude,
            longitude: request.longitude,
            scan_timestamp: Utc::now(),
            processing_time_ms: Some(processing_time_ms),
            error_message: None,
        };

        let updated = self
            .retry_transient(|| async {
                self.store
                    .increment_scan_and_record(&component.component_id, &event)
                    .await
            })
            .await?;

        Ok(ScanOutcome {
            scan_id: event.id,
            component: updated,
            synthesized,
            processing_time_ms,
        })
    }

    /// File a quality report. Critical severity forces the component to
    /// `Damaged` inside the same store transaction as the report insert.
    pub async fn file_report(&self, input: NewReport) -> LedgerResult<ReportOutcome> {
        let input = input.validated()?;
        let report = QualityReport {
            report_id: ReportId::new(),
            component_id: input.component_id,
            report_type: input.report_type,
            severity: input.severity,
            description: input.description,
            reported_by: input.reported_by,
            report_date: Utc::now(),
            resolution_status: ResolutionStatus::Open,
            priority: derive_priority(input.report_type, input.severity),
            estimated_cost: input.estimated_cost,
            actual_cost: None,
        };

        let outcome = self
            .retry_transient(|| async { self.store.create_quality_report(&report).await })
            .await?;

        if outcome.status_forced {
            tracing::info!(
                component_id = %report.component_id,
                report_id = %report.report_id,
                from = %outcome.previous_status,
                to = %outcome.new_status,
                "critical report forced a lifecycle transition"
            );
        }
        Ok(outcome)
    }

    /// Administrative status update, validated against the state machine.
    pub async fn update_status(
        &self,
        component_id: &ComponentId,
        change: StatusChange,
    ) -> LedgerResult<Component> {
        let change = change.validated()?;
        let current = self.component(component_id).await?;
        if current.status == ComponentStatus::Replaced {
            tracing::warn!(
                component_id = %component_id,
                target = %change.target,
                "transition out of Replaced requested"
            );
        }

        let updated = self
            .retry_transient(|| async {
                self.store
                    .update_status(
                        component_id,
                        change.target,
                        &change.actor,
                        change.notes.as_deref(),
                    )
                    .await
            })
            .await?;
        Ok(updated)
    }

    pub async fn component(&self, component_id: &ComponentId) -> LedgerResult<Component> {
        self.store
            .component_by_id(component_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("component {component_id}")))
    }

    pub async fn list(
        &self,
        filter: &ComponentFilter,
        page: PageRequest,
    ) -> LedgerResult<PageOf<Component>> {
        Ok(self.store.list_components(filter, page).await?)
    }

    pub async fn scan_history(&self, component_id: &ComponentId) -> LedgerResult<Vec<ScanEvent>> {
        self.component(component_id).await?;
        Ok(self.store.scan_history(component_id).await?)
    }

    pub async fn audit_trail(&self, component_id: &ComponentId) -> LedgerResult<Vec<AuditEntry>> {
        self.component(component_id).await?;
        Ok(self.store.audit_trail(component_id).await?)
    }

    pub async fn daily_stats(&self, date: NaiveDate) -> LedgerResult<DailyAggregate> {
        Ok(self.store.daily_aggregate(date).await?)
    }
}

fn orphan_event(
    code: &str,
    scanned_by: String,
    device_info: DeviceInfo,
    request: &ScanRequest,
    started: Instant,
    error_message: String,
) -> ScanEvent {
    ScanEvent {
        id: ScanId::new(),
        component_id: None,
        qr_code: code.to_string(),
        scanned_by,
        location: request.location.clone(),
        device_info,
        latitude: request.latitude,
        longitude: request.longitude,
        scan_timestamp: Utc::now(),
        processing_time_ms: Some(started.elapsed().as_millis() as u64),
        error_message: Some(error_message),
    }
}

/// Build the placeholder for a well-formed code the catalog has never seen.
/// Only what the code itself carries is trusted; everything else takes
/// neutral defaults and the record is marked `Synthesized`.
fn synthesize_placeholder(code: &str, payload: &QrPayload) -> Component {
    let now = Utc::now();
    Component {
        component_id: ComponentId::new(),
        qr_code: QrCode::from_raw(code),
        component_type: payload.component_type,
        manufacturer: payload.manufacturer_code.clone(),
        batch_number: payload.batch_code.clone(),
        manufacturing_date: None,
        installation_date: None,
        track_section: None,
        km_post: None,
        warranty_months: payload.component_type.default_warranty_months(),
        status: ComponentStatus::Active,
        scan_count: 0,
        last_scanned: None,
        origin: ComponentOrigin::Synthesized,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use railtag_store::{MemoryStore, SqliteStore, StoreResult};
    use railtag_types::{AuditAction, ComponentType, ReportType, Severity};
    use uuid::Uuid;

    fn ledger(store: Arc<dyn ComponentStore>) -> LedgerService {
        LedgerService::new(store)
    }

    /// Delegates to a real in-memory store but times out the first
    /// `failures` scan writes, mimicking a store under momentary pressure.
    struct FlakyStore {
        inner: MemoryStore,
        failures_left: std::sync::Mutex<u32>,
    }

    impl FlakyStore {
        fn failing_first(failures: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                failures_left: std::sync::Mutex::new(failures),
            }
        }

        fn trip(&self) -> StoreResult<()> {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(StoreError::Timeout("injected store timeout".into()));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl ComponentStore for FlakyStore {
        fn backend_name(&self) -> &'static str {
            "flaky-memory"
        }

        async fn ping(&self) -> StoreResult<()> {
            self.inner.ping().await
        }

        async fn create_component(&self, component: &Component) -> StoreResult<()> {
            self.inner.create_component(component).await
        }

        async fn component_by_id(&self, id: &ComponentId) -> StoreResult<Option<Component>> {
            self.inner.component_by_id(id).await
        }

        async fn component_by_qr(&self, qr_code: &str) -> StoreResult<Option<Component>> {
            self.inner.component_by_qr(qr_code).await
        }

        async fn list_components(
            &self,
            filter: &ComponentFilter,
            page: PageRequest,
        ) -> StoreResult<PageOf<Component>> {
            self.inner.list_components(filter, page).await
        }

        async fn increment_scan_and_record(
            &self,
            component_id: &ComponentId,
            event: &ScanEvent,
        ) -> StoreResult<Component> {
            self.trip()?;
            self.inner.increment_scan_and_record(component_id, event).await
        }

        async fn record_orphan_scan(&self, event: &ScanEvent) -> StoreResult<()> {
            self.trip()?;
            self.inner.record_orphan_scan(event).await
        }

        async fn create_quality_report(
            &self,
            report: &QualityReport,
        ) -> StoreResult<ReportOutcome> {
            self.inner.create_quality_report(report).await
        }

        async fn update_status(
            &self,
            component_id: &ComponentId,
            target: ComponentStatus,
            actor: &str,
            notes: Option<&str>,
        ) -> StoreResult<Component> {
            self.inner.update_status(component_id, target, actor, notes).await
        }

        async fn scan_history(&self, component_id: &ComponentId) -> StoreResult<Vec<ScanEvent>> {
            self.inner.scan_history(component_id).await
        }

        async fn audit_trail(&self, component_id: &ComponentId) -> StoreResult<Vec<AuditEntry>> {
            self.inner.audit_trail(component_id).await
        }

        async fn daily_aggregate(&self, date: NaiveDate) -> StoreResult<DailyAggregate> {
            self.inner.daily_aggregate(date).await
        }

        async fn purge_component(&self, component_id: &ComponentId) -> StoreResult<bool> {
            self.inner.purge_component(component_id).await
        }
    }

    fn flaky_ledger(failures: u32) -> LedgerService {
        LedgerService::with_options(
            Arc::new(FlakyStore::failing_first(failures)),
            LedgerOptions {
                retry_delay: Duration::from_millis(1),
                ..Default::default()
            },
        )
    }

    fn memory_ledger() -> LedgerService {
        ledger(Arc::new(MemoryStore::new()))
    }

    fn generation(component_type: ComponentType) -> NewComponent {
        NewComponent {
            component_type,
            manufacturer: "Tata Steel".into(),
            batch_number: "B1".into(),
            manufacturing_date: None,
            installation_date: None,
            track_section: Some("SEC-04".into()),
            km_post: Some(125.5),
            warranty_months: None,
        }
    }

    fn scan_request(code: &str) -> ScanRequest {
        ScanRequest {
            qr_code: code.into(),
            scanned_by: "inspector-1".into(),
            location: Some("SEC-04".into()),
            device_info: BTreeMap::new(),
            latitude: Some(28.61),
            longitude: Some(77.23),
        }
    }

    fn report(component_id: ComponentId, rt: ReportType, sev: Severity) -> NewReport {
        NewReport {
            component_id,
            report_type: rt,
            severity: sev,
            description: "observed in the field".into(),
            reported_by: "inspector-2".into(),
            estimated_cost: None,
        }
    }

    #[tokio::test]
    async fn generated_component_roundtrips_through_decode() {
        let ledger = memory_ledger();
        let c = ledger.generate(generation(ComponentType::Erc)).await.unwrap();

        assert_eq!(c.status, ComponentStatus::Active);
        assert_eq!(c.scan_count, 0);
        assert_eq!(c.warranty_months, 60);
        assert_eq!(c.origin, ComponentOrigin::Manufactured);

        let payload = c.qr_code.payload().unwrap();
        assert_eq!(payload.component_type, ComponentType::Erc);
        assert_eq!(payload.batch_code, "B1");

        let decoded = ledger.decode(c.qr_code.as_str()).await.unwrap();
        assert_eq!(decoded.component_id, c.component_id);
    }

    #[tokio::test]
    async fn generated_codes_are_unique() {
        let ledger = memory_ledger();
        let a = ledger.generate(generation(ComponentType::Rpd)).await.unwrap();
        let b = ledger.generate(generation(ComponentType::Rpd)).await.unwrap();
        assert_ne!(a.qr_code, b.qr_code);
        assert_eq!(a.warranty_months, 48);
    }

    #[tokio::test]
    async fn explicit_warranty_overrides_default() {
        let ledger = memory_ledger();
        let mut input = generation(ComponentType::Lnr);
        input.warranty_months = Some(24);
        let c = ledger.generate(input).await.unwrap();
        assert_eq!(c.warranty_months, 24);
    }

    #[tokio::test]
    async fn decode_of_unknown_code_is_not_found() {
        let ledger = memory_ledger();
        let code = format!("IR-ERC-M-B-{}", "0".repeat(32));
        assert!(matches!(
            ledger.decode(&code).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn example_flow_generate_scan_thrice_then_critical_report() {
        let ledger = Arc::new(memory_ledger());
        let c = ledger.generate(generation(ComponentType::Erc)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let ledger = Arc::clone(&ledger);
            let code = c.qr_code.as_str().to_string();
            handles.push(tokio::spawn(async move {
                ledger.scan(scan_request(&code)).await.unwrap()
            }));
        }
        for h in handles {
            let outcome = h.await.unwrap();
            assert!(!outcome.synthesized);
        }

        let after = ledger.component(&c.component_id).await.unwrap();
        assert_eq!(after.scan_count, 3);
        assert!(after.last_scanned.is_some());

        let outcome = ledger
            .file_report(report(c.component_id, ReportType::Damage, Severity::Critical))
            .await
            .unwrap();
        assert!(outcome.status_forced);
        assert_eq!(outcome.report.priority, 1);

        let final_state = ledger.component(&c.component_id).await.unwrap();
        assert_eq!(final_state.status, ComponentStatus::Damaged);

        let trail = ledger.audit_trail(&c.component_id).await.unwrap();
        assert!(trail.iter().any(|a| {
            a.action == AuditAction::StatusChanged
                && a.old_value.as_deref() == Some("Active")
                && a.new_value.as_deref() == Some("Damaged")
        }));
    }

    #[tokio::test]
    async fn missing_low_report_has_priority_three() {
        let ledger = memory_ledger();
        let c = ledger.generate(generation(ComponentType::Erc)).await.unwrap();
        let outcome = ledger
            .file_report(report(c.component_id, ReportType::Missing, Severity::Low))
            .await
            .unwrap();
        assert_eq!(outcome.report.priority, 3);
        assert!(!outcome.status_forced);
        assert_eq!(outcome.report.resolution_status, ResolutionStatus::Open);
    }

    #[tokio::test]
    async fn unknown_code_without_synthesis_is_ledgered_and_fails() {
        let ledger = memory_ledger();
        let code = format!("IR-ERC-TATASTEEL-B9-{}", Uuid::now_v7().simple());

        let err = ledger.scan(scan_request(&code)).await.unwrap_err();
        let LedgerError::UnknownCode { code: reported, scan_id: _ } = err else {
            panic!("expected UnknownCode, got {err:?}");
        };
        assert_eq!(reported, code);

        // The observation itself was kept.
        let today = ledger.daily_stats(Utc::now().date_naive()).await.unwrap();
        assert_eq!(today.scans_recorded, 1);
        assert_eq!(today.orphan_scans, 1);
    }

    #[tokio::test]
    async fn transient_increment_failure_is_retried_once() {
        let ledger = flaky_ledger(1);
        let c = ledger.generate(generation(ComponentType::Erc)).await.unwrap();

        let outcome = ledger.scan(scan_request(c.qr_code.as_str())).await.unwrap();
        assert_eq!(outcome.component.scan_count, 1);

        let history = ledger.scan_history(&c.component_id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn transient_orphan_write_is_retried_once() {
        let ledger = flaky_ledger(1);
        let code = format!("IR-ERC-TATASTEEL-B9-{}", Uuid::now_v7().simple());

        let err = ledger.scan(scan_request(&code)).await.unwrap_err();
        assert!(matches!(err, LedgerError::UnknownCode { .. }));

        // The observation survived the first timeout.
        let today = ledger.daily_stats(Utc::now().date_naive()).await.unwrap();
        assert_eq!(today.scans_recorded, 1);
        assert_eq!(today.orphan_scans, 1);
    }

    #[tokio::test]
    async fn transient_malformed_write_is_retried_once() {
        let ledger = flaky_ledger(1);

        let err = ledger.scan(scan_request("XX-NOT-A-CODE")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let today = ledger.daily_stats(Utc::now().date_naive()).await.unwrap();
        assert_eq!(today.orphan_scans, 1);
    }

    #[tokio::test]
    async fn persistent_timeout_exhausts_the_single_retry() {
        let ledger = flaky_ledger(2);
        let c = ledger.generate(generation(ComponentType::Erc)).await.unwrap();

        let err = ledger
            .scan(scan_request(c.qr_code.as_str()))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::TransientStore(_)));

        let after = ledger.component(&c.component_id).await.unwrap();
        assert_eq!(after.scan_count, 0);
    }

    #[tokio::test]
    async fn synthesis_mints_an_auditable_placeholder() {
        let store: Arc<dyn ComponentStore> = Arc::new(MemoryStore::new());
        let ledger = LedgerService::with_options(
            Arc::clone(&store),
            LedgerOptions {
                synthesize_unknown: true,
                ..Default::default()
            },
        );
        let code = format!("IR-LNR-JSW-B7-{}", Uuid::now_v7().simple());

        let outcome = ledger.scan(scan_request(&code)).await.unwrap();
        assert!(outcome.synthesized);
        assert_eq!(outcome.component.component_type, ComponentType::Lnr);
        assert_eq!(outcome.component.manufacturer, "JSW");
        assert_eq!(outcome.component.batch_number, "B7");
        assert_eq!(outcome.component.origin, ComponentOrigin::Synthesized);
        assert_eq!(outcome.component.scan_count, 1);

        let trail = ledger
            .audit_trail(&outcome.component.component_id)
            .await
            .unwrap();
        assert!(trail.iter().any(|a| a.action == AuditAction::Synthesized));

        // A second scan of the same code resolves normally.
        let again = ledger.scan(scan_request(&code)).await.unwrap();
        assert!(!again.synthesized);
        assert_eq!(again.component.scan_count, 2);
    }

    #[tokio::test]
    async fn malformed_code_is_a_validation_error_but_still_ledgered() {
        let ledger = memory_ledger();
        let err = ledger.scan(scan_request("XX-NOT-A-CODE")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let today = ledger.daily_stats(Utc::now().date_naive()).await.unwrap();
        assert_eq!(today.orphan_scans, 1);
    }

    #[tokio::test]
    async fn blank_code_records_nothing() {
        let ledger = memory_ledger();
        let err = ledger.scan(scan_request("   ")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let today = ledger.daily_stats(Utc::now().date_naive()).await.unwrap();
        assert_eq!(today.scans_recorded, 0);
    }

    #[tokio::test]
    async fn invalid_transition_surfaces_as_conflict() {
        let ledger = memory_ledger();
        let c = ledger.generate(generation(ComponentType::Erc)).await.unwrap();

        ledger
            .update_status(
                &c.component_id,
                StatusChange {
                    target: ComponentStatus::Inactive,
                    actor: "admin".into(),
                    notes: None,
                },
            )
            .await
            .unwrap();

        let err = ledger
            .update_status(
                &c.component_id,
                StatusChange {
                    target: ComponentStatus::Damaged,
                    actor: "admin".into(),
                    notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[tokio::test]
    async fn history_reads_check_the_component_exists() {
        let ledger = memory_ledger();
        let missing = ComponentId::new();
        assert!(matches!(
            ledger.scan_history(&missing).await,
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.audit_trail(&missing).await,
            Err(LedgerError::NotFound(_))
        ));
    }

    /// Drive the same externally observable scenario against both backends.
    #[tokio::test]
    async fn durable_and_fallback_backends_behave_identically() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("parity.db").display());
        let sqlite: Arc<dyn ComponentStore> = Arc::new(SqliteStore::connect(&url).await.unwrap());
        let memory: Arc<dyn ComponentStore> = Arc::new(MemoryStore::new());

        let mut observations = Vec::new();
        for store in [sqlite, memory] {
            let ledger = LedgerService::new(store);
            let c = ledger.generate(generation(ComponentType::Erc)).await.unwrap();

            for _ in 0..3 {
                ledger.scan(scan_request(c.qr_code.as_str())).await.unwrap();
            }
            let outcome = ledger
                .file_report(report(c.component_id, ReportType::Damage, Severity::Critical))
                .await
                .unwrap();
            let final_state = ledger.component(&c.component_id).await.unwrap();
            let history = ledger.scan_history(&c.component_id).await.unwrap();
            let trail = ledger.audit_trail(&c.component_id).await.unwrap();

            let err = ledger
                .update_status(
                    &c.component_id,
                    StatusChange {
                        target: ComponentStatus::Damaged,
                        actor: "admin".into(),
                        notes: None,
                    },
                )
                .await
                .unwrap_err();

            observations.push((
                final_state.scan_count,
                final_state.status,
                outcome.status_forced,
                outcome.report.priority,
                history.len(),
                trail.iter().map(|a| a.action).collect::<Vec<_>>(),
                matches!(err, LedgerError::Conflict(_)),
            ));
        }

        assert_eq!(observations[0], observations[1]);
        assert_eq!(observations[0].0, 3);
        assert_eq!(observations[0].1, ComponentStatus::Damaged);
    }
}
