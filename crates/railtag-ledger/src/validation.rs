use std::collections::BTreeMap;

use chrono::NaiveDate;
use railtag_types::{
    ComponentId, ComponentStatus, ComponentType, DeviceInfo, ReportType, Severity,
};

use crate::error::{LedgerError, LedgerResult};

/// Upper bound on free-text fields (description, notes, location).
const MAX_TEXT_LEN: usize = 4000;

/// Upper bound on short identity fields (manufacturer, names).
const MAX_NAME_LEN: usize = 256;

fn require_name(value: &str, field: &str) -> LedgerResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(LedgerError::Validation(format!(
            "{field} exceeds {MAX_NAME_LEN} bytes"
        )));
    }
    Ok(trimmed.to_string())
}

fn check_text(value: &Option<String>, field: &str) -> LedgerResult<()> {
    if let Some(v) = value {
        if v.len() > MAX_TEXT_LEN {
            return Err(LedgerError::Validation(format!(
                "{field} exceeds {MAX_TEXT_LEN} bytes"
            )));
        }
    }
    Ok(())
}

fn check_finite(value: Option<f64>, field: &str) -> LedgerResult<()> {
    if let Some(v) = value {
        if !v.is_finite() {
            return Err(LedgerError::Validation(format!("{field} must be finite")));
        }
    }
    Ok(())
}

/// Inputs for component generation.
#[derive(Clone, Debug)]
pub struct NewComponent {
    pub component_type: ComponentType,
    pub manufacturer: String,
    pub batch_number: String,
    pub manufacturing_date: Option<NaiveDate>,
    pub installation_date: Option<NaiveDate>,
    pub track_section: Option<String>,
    pub km_post: Option<f64>,
    /// Defaults per component type when unset.
    pub warranty_months: Option<u32>,
}

impl NewComponent {
    pub(crate) fn validated(mut self) -> LedgerResult<Self> {
        self.manufacturer = require_name(&self.manufacturer, "manufacturer")?;
        self.batch_number = require_name(&self.batch_number, "batch_number")?;
        check_text(&self.track_section, "track_section")?;
        check_finite(self.km_post, "km_post")?;
        if let Some(km) = self.km_post {
            if km < 0.0 {
                return Err(LedgerError::Validation("km_post must not be negative".into()));
            }
        }
        if self.warranty_months == Some(0) {
            return Err(LedgerError::Validation(
                "warranty_months must be at least 1".into(),
            ));
        }
        Ok(self)
    }
}

/// Inputs for recording one scan observation.
#[derive(Clone, Debug)]
pub struct ScanRequest {
    pub qr_code: String,
    pub scanned_by: String,
    pub location: Option<String>,
    pub device_info: BTreeMap<String, String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ScanRequest {
    /// Validate everything except the code itself (checked by the scan
    /// operation, which decides whether an orphan event is recorded).
    pub(crate) fn validated_context(&self) -> LedgerResult<(String, DeviceInfo)> {
        let scanned_by = require_name(&self.scanned_by, "scanned_by")?;
        check_text(&self.location, "location")?;
        if let Some(lat) = self.latitude {
            if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
                return Err(LedgerError::Validation("latitude out of range".into()));
            }
        }
        if let Some(lon) = self.longitude {
            if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
                return Err(LedgerError::Validation("longitude out of range".into()));
            }
        }
        let device_info = DeviceInfo::validated(self.device_info.clone())
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        Ok((scanned_by, device_info))
    }
}

/// Inputs for filing a quality report.
#[derive(Clone, Debug)]
pub struct NewReport {
    pub component_id: ComponentId,
    pub report_type: ReportType,
    pub severity: Severity,
    pub description: String,
    pub reported_by: String,
    pub estimated_cost: Option<f64>,
}

impl NewReport {
    pub(crate) fn validated(mut self) -> LedgerResult<Self> {
        self.reported_by = require_name(&self.reported_by, "reported_by")?;
        let description = self.description.trim();
        if description.is_empty() {
            return Err(LedgerError::Validation("description must not be empty".into()));
        }
        if description.len() > MAX_TEXT_LEN {
            return Err(LedgerError::Validation(format!(
                "description exceeds {MAX_TEXT_LEN} bytes"
            )));
        }
        self.description = description.to_string();
        check_finite(self.estimated_cost, "estimated_cost")?;
        if let Some(cost) = self.estimated_cost {
            if cost < 0.0 {
                return Err(LedgerError::Validation(
                    "estimated_cost must not be negative".into(),
                ));
            }
        }
        Ok(self)
    }
}

/// Inputs for an administrative status update.
#[derive(Clone, Debug)]
pub struct StatusChange {
    pub target: ComponentStatus,
    pub actor: String,
    pub notes: Option<String>,
}

impl StatusChange {
    pub(crate) fn validated(mut self) -> LedgerResult<Self> {
        self.actor = require_name(&self.actor, "actor")?;
        check_text(&self.notes, "notes")?;
        Ok(self)
    }
}
