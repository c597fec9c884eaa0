use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::component::ComponentId;
use crate::error::TypeError;

/// Category of an operator-filed quality observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportType {
    Damage,
    Quality,
    Missing,
    Defective,
    Wear,
    Corrosion,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Damage => "Damage",
            Self::Quality => "Quality",
            Self::Missing => "Missing",
            Self::Defective => "Defective",
            Self::Wear => "Wear",
            Self::Corrosion => "Corrosion",
        }
    }

    /// Missing parts and outright damage are handled one priority level
    /// sooner than their severity alone would dictate.
    pub fn escalates_priority(&self) -> bool {
        matches!(self, Self::Missing | Self::Damage)
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Damage" => Ok(Self::Damage),
            "Quality" => Ok(Self::Quality),
            "Missing" => Ok(Self::Missing),
            "Defective" => Ok(Self::Defective),
            "Wear" => Ok(Self::Wear),
            "Corrosion" => Ok(Self::Corrosion),
            other => Err(TypeError::UnknownReportType(other.to_string())),
        }
    }
}

/// Severity scale for quality reports. `Critical` forces the referenced
/// component into `Damaged`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Base priority on the 1 (highest) .. 5 (lowest) scale.
    pub fn base_priority(&self) -> u8 {
        match self {
            Self::Critical => 1,
            Self::High => 2,
            Self::Medium => 3,
            Self::Low => 4,
        }
    }

    pub fn forces_damaged(&self) -> bool {
        matches!(self, Self::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            "Critical" => Ok(Self::Critical),
            other => Err(TypeError::UnknownSeverity(other.to_string())),
        }
    }
}

/// Workflow state of a report. Reports are created `Open`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
    Escalated,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "InProgress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
            Self::Escalated => "Escalated",
        }
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Open" => Ok(Self::Open),
            "InProgress" => Ok(Self::InProgress),
            "Resolved" => Ok(Self::Resolved),
            "Closed" => Ok(Self::Closed),
            "Escalated" => Ok(Self::Escalated),
            other => Err(TypeError::UnknownResolutionStatus(other.to_string())),
        }
    }
}

/// Derive a report's priority from its type and severity.
///
/// Base priority comes from severity (Critical=1, High=2, Medium=3, Low=4);
/// `Missing` and `Damage` reports are promoted one level, floored at 1. The
/// derivation is deterministic and reproducible from `(report_type,
/// severity)` alone.
pub fn derive_priority(report_type: ReportType, severity: Severity) -> u8 {
    let base = severity.base_priority();
    if report_type.escalates_priority() {
        base.saturating_sub(1).max(1)
    } else {
        base
    }
}

/// Unique identifier for a quality report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(Uuid);

impl ReportId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReportId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| TypeError::InvalidId(e.to_string()))
    }
}

/// An operator-filed observation of a defect or issue against a component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub report_id: ReportId,
    pub component_id: ComponentId,
    pub report_type: ReportType,
    pub severity: Severity,
    pub description: String,
    pub reported_by: String,
    pub report_date: DateTime<Utc>,
    pub resolution_status: ResolutionStatus,
    /// Derived at creation; see [`derive_priority`].
    pub priority: u8,
    pub estimated_cost: Option<f64>,
    pub actual_cost: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_priorities() {
        assert_eq!(Severity::Critical.base_priority(), 1);
        assert_eq!(Severity::High.base_priority(), 2);
        assert_eq!(Severity::Medium.base_priority(), 3);
        assert_eq!(Severity::Low.base_priority(), 4);
    }

    #[test]
    fn missing_and_damage_promote_one_level() {
        assert_eq!(derive_priority(ReportType::Missing, Severity::Low), 3);
        assert_eq!(derive_priority(ReportType::Damage, Severity::Medium), 2);
        assert_eq!(derive_priority(ReportType::Missing, Severity::High), 1);
    }

    #[test]
    fn promotion_floors_at_one() {
        assert_eq!(derive_priority(ReportType::Damage, Severity::Critical), 1);
        assert_eq!(derive_priority(ReportType::Missing, Severity::Critical), 1);
    }

    #[test]
    fn other_types_keep_base_priority() {
        assert_eq!(derive_priority(ReportType::Wear, Severity::Low), 4);
        assert_eq!(derive_priority(ReportType::Quality, Severity::Critical), 1);
        assert_eq!(derive_priority(ReportType::Corrosion, Severity::High), 2);
    }

    #[test]
    fn only_critical_forces_damaged() {
        assert!(Severity::Critical.forces_damaged());
        assert!(!Severity::High.forces_damaged());
        assert!(!Severity::Medium.forces_damaged());
        assert!(!Severity::Low.forces_damaged());
    }

    #[test]
    fn enum_string_roundtrips() {
        for t in [
            ReportType::Damage,
            ReportType::Quality,
            ReportType::Missing,
            ReportType::Defective,
            ReportType::Wear,
            ReportType::Corrosion,
        ] {
            assert_eq!(t.as_str().parse::<ReportType>().unwrap(), t);
        }
        for s in [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ] {
            assert_eq!(s.as_str().parse::<Severity>().unwrap(), s);
        }
        for r in [
            ResolutionStatus::Open,
            ResolutionStatus::InProgress,
            ResolutionStatus::Resolved,
            ResolutionStatus::Closed,
            ResolutionStatus::Escalated,
        ] {
            assert_eq!(r.as_str().parse::<ResolutionStatus>().unwrap(), r);
        }
    }
}
