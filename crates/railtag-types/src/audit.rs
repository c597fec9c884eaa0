use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::component::{ComponentId, ComponentStatus};
use crate::error::TypeError;
use crate::report::ReportId;

/// What an audit entry records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    StatusChanged,
    ReportFiled,
    Synthesized,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StatusChanged => "status_changed",
            Self::ReportFiled => "report_filed",
            Self::Synthesized => "synthesized",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "status_changed" => Ok(Self::StatusChanged),
            "report_filed" => Ok(Self::ReportFiled),
            "synthesized" => Ok(Self::Synthesized),
            other => Err(TypeError::UnknownAuditAction(other.to_string())),
        }
    }
}

/// One append-only audit record. The trail is never edited or deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub component_id: ComponentId,
    pub action: AuditAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor: String,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Record a lifecycle transition.
    pub fn status_changed(
        component_id: ComponentId,
        old: ComponentStatus,
        new: ComponentStatus,
        actor: impl Into<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            component_id,
            action: AuditAction::StatusChanged,
            old_value: Some(old.as_str().to_string()),
            new_value: Some(new.as_str().to_string()),
            actor: actor.into(),
            notes,
            recorded_at: Utc::now(),
        }
    }

    /// Record a quality-report filing.
    pub fn report_filed(
        component_id: ComponentId,
        report_id: ReportId,
        priority: u8,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            component_id,
            action: AuditAction::ReportFiled,
            old_value: None,
            new_value: Some(format!("{report_id} (priority {priority})")),
            actor: actor.into(),
            notes: None,
            recorded_at: Utc::now(),
        }
    }

    /// Record the minting of a non-authoritative placeholder component.
    pub fn synthesized(
        component_id: ComponentId,
        qr_code: &str,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            component_id,
            action: AuditAction::Synthesized,
            old_value: None,
            new_value: Some(qr_code.to_string()),
            actor: actor.into(),
            notes: Some("placeholder minted for unrecognized code".to_string()),
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_roundtrip() {
        for a in [
            AuditAction::StatusChanged,
            AuditAction::ReportFiled,
            AuditAction::Synthesized,
        ] {
            assert_eq!(a.as_str().parse::<AuditAction>().unwrap(), a);
        }
        assert!("deleted".parse::<AuditAction>().is_err());
    }

    #[test]
    fn status_change_captures_old_and_new() {
        let id = ComponentId::new();
        let entry = AuditEntry::status_changed(
            id,
            ComponentStatus::Active,
            ComponentStatus::Damaged,
            "critical-report",
            None,
        );
        assert_eq!(entry.component_id, id);
        assert_eq!(entry.old_value.as_deref(), Some("Active"));
        assert_eq!(entry.new_value.as_deref(), Some("Damaged"));
        assert_eq!(entry.action, AuditAction::StatusChanged);
    }

    #[test]
    fn report_filing_references_the_report() {
        let report_id = ReportId::new();
        let entry = AuditEntry::report_filed(ComponentId::new(), report_id, 1, "inspector-3");
        assert!(entry.new_value.unwrap().contains(&report_id.to_string()));
    }

    #[test]
    fn synthesis_is_marked_non_authoritative() {
        let entry = AuditEntry::synthesized(ComponentId::new(), "IR-ERC-M-B-00", "scanner-1");
        assert_eq!(entry.action, AuditAction::Synthesized);
        assert!(entry.notes.unwrap().contains("placeholder"));
    }
}
