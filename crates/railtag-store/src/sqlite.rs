use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use railtag_types::{
    next_status, AuditAction, AuditEntry, Component, ComponentId, ComponentOrigin,
    ComponentStatus, DailyAggregate, DeviceInfo, QrCode, QualityReport, ReportId, ReportType,
    ResolutionStatus, ScanEvent, ScanId, StatusTrigger,
};

use crate::error::{StoreError, StoreResult};
use crate::traits::{ComponentFilter, ComponentStore, PageOf, PageRequest, ReportOutcome};

/// Idempotent schema, one statement per entry. Child tables cascade on
/// component deletion so a purge is a single DELETE.
const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS components (
        component_id TEXT PRIMARY KEY,
        qr_code TEXT NOT NULL UNIQUE,
        component_type TEXT NOT NULL,
        manufacturer TEXT NOT NULL,
        batch_number TEXT NOT NULL,
        manufacturing_date TEXT,
        installation_date TEXT,
        track_section TEXT,
        km_post REAL,
        warranty_months INTEGER NOT NULL,
        status TEXT NOT NULL,
        scan_count INTEGER NOT NULL DEFAULT 0,
        last_scanned TEXT,
        origin TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_components_type ON components (component_type)",
    "CREATE INDEX IF NOT EXISTS idx_components_status ON components (status)",
    "CREATE INDEX IF NOT EXISTS idx_components_manufacturer ON components (manufacturer)",
    "CREATE TABLE IF NOT EXISTS scan_history (
        id TEXT PRIMARY KEY,
        component_id TEXT REFERENCES components (component_id) ON DELETE CASCADE,
        qr_code TEXT NOT NULL,
        scanned_by TEXT NOT NULL,
        location TEXT,
        device_info TEXT NOT NULL,
        latitude REAL,
        longitude REAL,
        scan_timestamp TEXT NOT NULL,
        processing_time_ms INTEGER,
        error_message TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_scan_history_component
        ON scan_history (component_id, scan_timestamp)",
    "CREATE TABLE IF NOT EXISTS quality_reports (
        report_id TEXT PRIMARY KEY,
        component_id TEXT NOT NULL REFERENCES components (component_id) ON DELETE CASCADE,
        report_type TEXT NOT NULL,
        severity TEXT NOT NULL,
        description TEXT NOT NULL,
        reported_by TEXT NOT NULL,
        report_date TEXT NOT NULL,
        resolution_status TEXT NOT NULL,
        priority INTEGER NOT NULL,
        estimated_cost REAL,
        actual_cost REAL
    )",
    "CREATE INDEX IF NOT EXISTS idx_quality_reports_component
        ON quality_reports (component_id)",
    "CREATE TABLE IF NOT EXISTS audit_log (
        id TEXT PRIMARY KEY,
        component_id TEXT NOT NULL REFERENCES components (component_id) ON DELETE CASCADE,
        action TEXT NOT NULL,
        old_value TEXT,
        new_value TEXT,
        actor TEXT NOT NULL,
        notes TEXT,
        recorded_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_audit_log_component
        ON audit_log (component_id, recorded_at)",
    "CREATE TABLE IF NOT EXISTS daily_stats (
        stat_date TEXT PRIMARY KEY,
        components_created INTEGER NOT NULL DEFAULT 0,
        scans_recorded INTEGER NOT NULL DEFAULT 0,
        orphan_scans INTEGER NOT NULL DEFAULT 0,
        reports_filed INTEGER NOT NULL DEFAULT 0
    )",
];

/// Durable store backed by SQLite via sqlx.
///
/// Timestamps are stored as RFC 3339 UTC text with microsecond precision, so
/// lexicographic order is chronological order and `last_scanned` comparisons
/// can happen inside SQL. Read-modify-write operations open with an UPDATE so
/// the write lock is taken before any decision is made; with WAL and a busy
/// timeout, contention surfaces as a retryable [`StoreError::Timeout`] rather
/// than a lost update.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and apply the schema.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&pool).await?;
        }
        tracing::debug!(url, "sqlite store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ComponentFilter) {
        if let Some(ct) = filter.component_type {
            qb.push(" AND component_type = ").push_bind(ct.code());
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(manufacturer) = &filter.manufacturer {
            qb.push(" AND manufacturer = ")
                .push_bind(manufacturer.clone())
                .push(" COLLATE NOCASE");
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search.to_lowercase());
            qb.push(" AND (lower(qr_code) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(batch_number) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(manufacturer) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(coalesce(track_section, '')) LIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }
}

fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(value: &str, what: &'static str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            what,
            reason: format!("{value:?}: {e}"),
        })
}

fn parse_date(value: &str, what: &'static str) -> StoreResult<NaiveDate> {
    value.parse().map_err(|e| StoreError::Corrupt {
        what,
        reason: format!("{value:?}: {e}"),
    })
}

fn to_count(value: i64, what: &'static str) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt {
        what,
        reason: format!("negative counter {value}"),
    })
}

fn component_from_row(row: &SqliteRow) -> StoreResult<Component> {
    let manufacturing_date = row
        .try_get::<Option<String>, _>("manufacturing_date")?
        .map(|d| parse_date(&d, "components.manufacturing_date"))
        .transpose()?;
    let installation_date = row
        .try_get::<Option<String>, _>("installation_date")?
        .map(|d| parse_date(&d, "components.installation_date"))
        .transpose()?;
    let last_scanned = row
        .try_get::<Option<String>, _>("last_scanned")?
        .map(|ts| parse_ts(&ts, "components.last_scanned"))
        .transpose()?;

    Ok(Component {
        component_id: row.try_get::<String, _>("component_id")?.parse()?,
        qr_code: QrCode::from_raw(row.try_get::<String, _>("qr_code")?),
        component_type: row.try_get::<String, _>("component_type")?.parse()?,
        manufacturer: row.try_get("manufacturer")?,
        batch_number: row.try_get("batch_number")?,
        manufacturing_date,
        installation_date,
        track_section: row.try_get("track_section")?,
        km_post: row.try_get("km_post")?,
        warranty_months: u32::try_from(row.try_get::<i64, _>("warranty_months")?).map_err(
            |_| StoreError::Corrupt {
                what: "components.warranty_months",
                reason: "out of range".into(),
            },
        )?,
        status: row.try_get::<String, _>("status")?.parse()?,
        scan_count: to_count(row.try_get("scan_count")?, "components.scan_count")?,
        last_scanned,
        origin: row.try_get::<String, _>("origin")?.parse()?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?, "components.created_at")?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?, "components.updated_at")?,
    })
}

fn scan_from_row(row: &SqliteRow) -> StoreResult<ScanEvent> {
    let device_info: DeviceInfo =
        serde_json::from_str(&row.try_get::<String, _>("device_info")?)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(ScanEvent {
        id: row.try_get::<String, _>("id")?.parse::<ScanId>()?,
        component_id: row
            .try_get::<Option<String>, _>("component_id")?
            .map(|id| id.parse::<ComponentId>())
            .transpose()?,
        qr_code: row.try_get("qr_code")?,
        scanned_by: row.try_get("scanned_by")?,
        location: row.try_get("location")?,
        device_info,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        scan_timestamp: parse_ts(
            &row.try_get::<String, _>("scan_timestamp")?,
            "scan_history.scan_timestamp",
        )?,
        processing_time_ms: row
            .try_get::<Option<i64>, _>("processing_time_ms")?
            .map(|ms| to_count(ms, "scan_history.processing_time_ms"))
            .transpose()?,
        error_message: row.try_get("error_message")?,
    })
}

fn audit_from_row(row: &SqliteRow) -> StoreResult<AuditEntry> {
    Ok(AuditEntry {
        id: row
            .try_get::<String, _>("id")?
            .parse()
            .map_err(|e: uuid::Error| StoreError::Corrupt {
                what: "audit_log.id",
                reason: e.to_string(),
            })?,
        component_id: row.try_get::<String, _>("component_id")?.parse()?,
        action: row.try_get::<String, _>("action")?.parse::<AuditAction>()?,
        old_value: row.try_get("old_value")?,
        new_value: row.try_get("new_value")?,
        actor: row.try_get("actor")?,
        notes: row.try_get("notes")?,
        recorded_at: parse_ts(
            &row.try_get::<String, _>("recorded_at")?,
            "audit_log.recorded_at",
        )?,
    })
}

fn report_from_row(row: &SqliteRow) -> StoreResult<QualityReport> {
    Ok(QualityReport {
        report_id: row.try_get::<String, _>("report_id")?.parse::<ReportId>()?,
        component_id: row.try_get::<String, _>("component_id")?.parse()?,
        report_type: row.try_get::<String, _>("report_type")?.parse::<ReportType>()?,
        severity: row.try_get::<String, _>("severity")?.parse()?,
        description: row.try_get("description")?,
        reported_by: row.try_get("reported_by")?,
        report_date: parse_ts(
            &row.try_get::<String, _>("report_date")?,
            "quality_reports.report_date",
        )?,
        resolution_status: row
            .try_get::<String, _>("resolution_status")?
            .parse::<ResolutionStatus>()?,
        priority: u8::try_from(row.try_get::<i64, _>("priority")?).map_err(|_| {
            StoreError::Corrupt {
                what: "quality_reports.priority",
                reason: "out of range".into(),
            }
        })?,
        estimated_cost: row.try_get("estimated_cost")?,
        actual_cost: row.try_get("actual_cost")?,
    })
}

async fn insert_scan_event(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    event: &ScanEvent,
) -> StoreResult<()> {
    let device_info = serde_json::to_string(&event.device_info)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    sqlx::query(
        "INSERT INTO scan_history (
            id, component_id, qr_code, scanned_by, location, device_info,
            latitude, longitude, scan_timestamp, processing_time_ms, error_message
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(event.id.to_string())
    .bind(event.component_id.map(|id| id.to_string()))
    .bind(&event.qr_code)
    .bind(&event.scanned_by)
    .bind(&event.location)
    .bind(device_info)
    .bind(event.latitude)
    .bind(event.longitude)
    .bind(fmt_ts(&event.scan_timestamp))
    .bind(event.processing_time_ms.map(|ms| ms as i64))
    .bind(&event.error_message)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_audit_entry(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    entry: &AuditEntry,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO audit_log (id, component_id, action, old_value, new_value, actor, notes, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(entry.id.to_string())
    .bind(entry.component_id.to_string())
    .bind(entry.action.as_str())
    .bind(&entry.old_value)
    .bind(&entry.new_value)
    .bind(&entry.actor)
    .bind(&entry.notes)
    .bind(fmt_ts(&entry.recorded_at))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn bump_daily(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    date: NaiveDate,
    components: u32,
    scans: u32,
    orphans: u32,
    reports: u32,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO daily_stats (stat_date, components_created, scans_recorded, orphan_scans, reports_filed)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (stat_date) DO UPDATE SET
            components_created = components_created + excluded.components_created,
            scans_recorded = scans_recorded + excluded.scans_recorded,
            orphan_scans = orphan_scans + excluded.orphan_scans,
            reports_filed = reports_filed + excluded.reports_filed",
    )
    .bind(date.to_string())
    .bind(i64::from(components))
    .bind(i64::from(scans))
    .bind(i64::from(orphans))
    .bind(i64::from(reports))
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Take the write lock on a component row before anything else in the
/// transaction, returning the current row. The self-assignment changes no
/// data.
async fn lock_component_row(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    component_id: &ComponentId,
) -> StoreResult<SqliteRow> {
    sqlx::query(
        "UPDATE components SET component_id = component_id WHERE component_id = ?1 RETURNING *",
    )
    .bind(component_id.to_string())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| StoreError::ComponentNotFound(component_id.to_string()))
}

#[async_trait]
impl ComponentStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_component(&self, component: &Component) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO components (
                component_id, qr_code, component_type, manufacturer, batch_number,
                manufacturing_date, installation_date, track_section, km_post,
                warranty_months, status, scan_count, last_scanned, origin,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )
        .bind(component.component_id.to_string())
        .bind(component.qr_code.as_str())
        .bind(component.component_type.code())
        .bind(&component.manufacturer)
        .bind(&component.batch_number)
        .bind(component.manufacturing_date.map(|d| d.to_string()))
        .bind(component.installation_date.map(|d| d.to_string()))
        .bind(&component.track_section)
        .bind(component.km_post)
        .bind(i64::from(component.warranty_months))
        .bind(component.status.as_str())
        .bind(component.scan_count as i64)
        .bind(component.last_scanned.as_ref().map(fmt_ts))
        .bind(component.origin.as_str())
        .bind(fmt_ts(&component.created_at))
        .bind(fmt_ts(&component.updated_at))
        .execute(&mut *tx)
        .await?;

        if component.origin == ComponentOrigin::Synthesized {
            let entry = AuditEntry::synthesized(
                component.component_id,
                component.qr_code.as_str(),
                "ledger",
            );
            insert_audit_entry(&mut tx, &entry).await?;
        }
        bump_daily(&mut tx, component.created_at.date_naive(), 1, 0, 0, 0).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn component_by_id(&self, id: &ComponentId) -> StoreResult<Option<Component>> {
        sqlx::query("SELECT * FROM components WHERE component_id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .map(|row| component_from_row(&row))
            .transpose()
    }

    async fn component_by_qr(&self, qr_code: &str) -> StoreResult<Option<Component>> {
        sqlx::query("SELECT * FROM components WHERE qr_code = ?1")
            .bind(qr_code)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| component_from_row(&row))
            .transpose()
    }

    async fn list_components(
        &self,
        filter: &ComponentFilter,
        page: PageRequest,
    ) -> StoreResult<PageOf<Component>> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM components WHERE 1 = 1");
        Self::push_filter(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::new("SELECT * FROM components WHERE 1 = 1");
        Self::push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at, component_id LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(component_from_row)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(PageOf {
            items,
            total: to_count(total, "components count")?,
            page: page.page,
            limit: page.limit,
        })
    }

    async fn increment_scan_and_record(
        &self,
        component_id: &ComponentId,
        event: &ScanEvent,
    ) -> StoreResult<Component> {
        let mut tx = self.pool.begin().await?;
        // The comparison works on text because timestamps are RFC 3339 UTC
        // with fixed precision.
        let row = sqlx::query(
            "UPDATE components SET
                scan_count = scan_count + 1,
                last_scanned = CASE
                    WHEN last_scanned IS NULL OR last_scanned < ?1 THEN ?1
                    ELSE last_scanned
                END,
                updated_at = ?2
             WHERE component_id = ?3
             RETURNING *",
        )
        .bind(fmt_ts(&event.scan_timestamp))
        .bind(fmt_ts(&Utc::now()))
        .bind(component_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::ComponentNotFound(component_id.to_string()))?;

        let component = component_from_row(&row)?;
        insert_scan_event(&mut tx, event).await?;
        bump_daily(&mut tx, event.scan_timestamp.date_naive(), 0, 1, 0, 0).await?;
        tx.commit().await?;
        Ok(component)
    }

    async fn record_orphan_scan(&self, event: &ScanEvent) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_scan_event(&mut tx, event).await?;
        bump_daily(&mut tx, event.scan_timestamp.date_naive(), 0, 1, 1, 0).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn create_quality_report(&self, report: &QualityReport) -> StoreResult<ReportOutcome> {
        let mut tx = self.pool.begin().await?;
        let row = lock_component_row(&mut tx, &report.component_id).await?;
        let previous_status: ComponentStatus = row.try_get::<String, _>("status")?.parse()?;

        let (new_status, status_forced) = if report.severity.forces_damaged() {
            let next = next_status(previous_status, StatusTrigger::CriticalReport)?;
            (next, next != previous_status)
        } else {
            (previous_status, false)
        };

        if status_forced {
            sqlx::query(
                "UPDATE components SET status = ?1, updated_at = ?2 WHERE component_id = ?3",
            )
            .bind(new_status.as_str())
            .bind(fmt_ts(&Utc::now()))
            .bind(report.component_id.to_string())
            .execute(&mut *tx)
            .await?;

            let entry = AuditEntry::status_changed(
                report.component_id,
                previous_status,
                new_status,
                report.reported_by.clone(),
                Some(format!("forced by critical report {}", report.report_id)),
            );
            insert_audit_entry(&mut tx, &entry).await?;
        }

        sqlx::query(
            "INSERT INTO quality_reports (
                report_id, component_id, report_type, severity, description,
                reported_by, report_date, resolution_status, priority,
                estimated_cost, actual_cost
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(report.report_id.to_string())
        .bind(report.component_id.to_string())
        .bind(report.report_type.as_str())
        .bind(report.severity.as_str())
        .bind(&report.description)
        .bind(&report.reported_by)
        .bind(fmt_ts(&report.report_date))
        .bind(report.resolution_status.as_str())
        .bind(i64::from(report.priority))
        .bind(report.estimated_cost)
        .bind(report.actual_cost)
        .execute(&mut *tx)
        .await?;

        let filing = AuditEntry::report_filed(
            report.component_id,
            report.report_id,
            report.priority,
            report.reported_by.clone(),
        );
        insert_audit_entry(&mut tx, &filing).await?;
        bump_daily(&mut tx, report.report_date.date_naive(), 0, 0, 0, 1).await?;
        tx.commit().await?;

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
        let mut tx = self.pool.begin().await?;
        let row = lock_component_row(&mut tx, component_id).await?;
        let previous: ComponentStatus = row.try_get::<String, _>("status")?.parse()?;
        let next = next_status(previous, StatusTrigger::Administrative { target })?;

        let row = sqlx::query(
            "UPDATE components SET status = ?1, updated_at = ?2 WHERE component_id = ?3 RETURNING *",
        )
        .bind(next.as_str())
        .bind(fmt_ts(&Utc::now()))
        .bind(component_id.to_string())
        .fetch_one(&mut *tx)
        .await?;
        let component = component_from_row(&row)?;

        let entry = AuditEntry::status_changed(
            *component_id,
            previous,
            next,
            actor,
            notes.map(str::to_string),
        );
        insert_audit_entry(&mut tx, &entry).await?;
        tx.commit().await?;
        Ok(component)
    }

    async fn scan_history(&self, component_id: &ComponentId) -> StoreResult<Vec<ScanEvent>> {
        let rows = sqlx::query(
            "SELECT * FROM scan_history WHERE component_id = ?1 ORDER BY scan_timestamp, id",
        )
        .bind(component_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(scan_from_row).collect()
    }

    async fn audit_trail(&self, component_id: &ComponentId) -> StoreResult<Vec<AuditEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM audit_log WHERE component_id = ?1 ORDER BY recorded_at, id",
        )
        .bind(component_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(audit_from_row).collect()
    }

    async fn daily_aggregate(&self, date: NaiveDate) -> StoreResult<DailyAggregate> {
        let row = sqlx::query("SELECT * FROM daily_stats WHERE stat_date = ?1")
            .bind(date.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            None => Ok(DailyAggregate::empty(date)),
            Some(row) => Ok(DailyAggregate {
                stat_date: date,
                components_created: to_count(
                    row.try_get("components_created")?,
                    "daily_stats.components_created",
                )?,
                scans_recorded: to_count(
                    row.try_get("scans_recorded")?,
                    "daily_stats.scans_recorded",
                )?,
                orphan_scans: to_count(row.try_get("orphan_scans")?, "daily_stats.orphan_scans")?,
                reports_filed: to_count(
                    row.try_get("reports_filed")?,
                    "daily_stats.reports_filed",
                )?,
            }),
        }
    }

    async fn purge_component(&self, component_id: &ComponentId) -> StoreResult<bool> {
        // Child rows cascade.
        let result = sqlx::query("DELETE FROM components WHERE component_id = ?1")
            .bind(component_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Fetch all reports for a component, newest first. Used by tests and kept
/// on the concrete type; the trait surface does not need it.
impl SqliteStore {
    pub async fn reports_for(&self, component_id: &ComponentId) -> StoreResult<Vec<QualityReport>> {
        let rows = sqlx::query(
            "SELECT * FROM quality_reports WHERE component_id = ?1 ORDER BY report_date DESC",
        )
        .bind(component_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(report_from_row).collect()
    }
}
