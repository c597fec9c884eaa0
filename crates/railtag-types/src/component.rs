use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;
use crate::qr::QrCode;

/// Kind of track fitting a component is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    /// Elastic rail clip.
    #[serde(rename = "ERC")]
    Erc,
    /// Rail pad.
    #[serde(rename = "RPD")]
    Rpd,
    /// Liner.
    #[serde(rename = "LNR")]
    Lnr,
}

impl ComponentType {
    /// The three-letter code stamped into QR codes and stored on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Erc => "ERC",
            Self::Rpd => "RPD",
            Self::Lnr => "LNR",
        }
    }

    /// Default warranty when generation omits one, per the standard
    /// maintenance interval for each fitting kind.
    pub fn default_warranty_months(&self) -> u32 {
        match self {
            Self::Erc => 60,
            Self::Rpd => 48,
            Self::Lnr => 72,
        }
    }

    pub const ALL: [ComponentType; 3] = [Self::Erc, Self::Rpd, Self::Lnr];
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ComponentType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERC" => Ok(Self::Erc),
            "RPD" => Ok(Self::Rpd),
            "LNR" => Ok(Self::Lnr),
            other => Err(TypeError::UnknownComponentType(other.to_string())),
        }
    }
}

/// Lifecycle status of a component. Transitions are governed by
/// [`crate::status::next_status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentStatus {
    Active,
    Inactive,
    Replaced,
    Damaged,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Replaced => "Replaced",
            Self::Damaged => "Damaged",
        }
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(Self::Active),
            "Inactive" => Ok(Self::Inactive),
            "Replaced" => Ok(Self::Replaced),
            "Damaged" => Ok(Self::Damaged),
            other => Err(TypeError::UnknownStatus(other.to_string())),
        }
    }
}

/// How a component record entered the catalog.
///
/// `Synthesized` marks a placeholder minted during an unknown-code scan in
/// demo/offline mode. Such records are non-authoritative and must stay
/// distinguishable from manufactured inventory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentOrigin {
    Manufactured,
    Synthesized,
}

impl ComponentOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufactured => "Manufactured",
            Self::Synthesized => "Synthesized",
        }
    }
}

impl fmt::Display for ComponentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentOrigin {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Manufactured" => Ok(Self::Manufactured),
            "Synthesized" => Ok(Self::Synthesized),
            other => Err(TypeError::UnknownStatus(other.to_string())),
        }
    }
}

/// Unique identifier for a component, assigned once at generation and never
/// reassigned. UUIDv7, so ids are time-ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(Uuid);

impl ComponentId {
    /// Mint a fresh, time-ordered id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ComponentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| TypeError::InvalidId(e.to_string()))
    }
}

/// A single physical track fitting with a durable QR identity.
///
/// `component_id` and `qr_code` are globally unique and immutable for the
/// lifetime of the record. `scan_count` only ever increases, and `status`
/// moves only through the lifecycle state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub component_id: ComponentId,
    pub qr_code: QrCode,
    pub component_type: ComponentType,
    pub manufacturer: String,
    pub batch_number: String,
    pub manufacturing_date: Option<NaiveDate>,
    pub installation_date: Option<NaiveDate>,
    pub track_section: Option<String>,
    pub km_post: Option<f64>,
    pub warranty_months: u32,
    pub status: ComponentStatus,
    pub scan_count: u64,
    pub last_scanned: Option<DateTime<Utc>>,
    pub origin: ComponentOrigin,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Component {
    /// Advance the scan counters for one recorded scan.
    ///
    /// `last_scanned` tracks the chronologically latest scan, not the most
    /// recently recorded one, so out-of-order arrival cannot move it
    /// backwards.
    pub fn note_scan(&mut self, scanned_at: DateTime<Utc>) {
        self.scan_count += 1;
        self.last_scanned = Some(match self.last_scanned {
            Some(existing) => existing.max(scanned_at),
            None => scanned_at,
        });
        self.updated_at = Utc::now();
    }

    /// Apply an already-validated status transition.
    pub fn apply_status(&mut self, new_status: ComponentStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Component {
        let now = Utc::now();
        Component {
            component_id: ComponentId::new(),
            qr_code: QrCode::mint(ComponentType::Erc, "Tata Steel", "B1").unwrap(),
            component_type: ComponentType::Erc,
            manufacturer: "Tata Steel".into(),
            batch_number: "B1".into(),
            manufacturing_date: None,
            installation_date: None,
            track_section: None,
            km_post: None,
            warranty_months: 60,
            status: ComponentStatus::Active,
            scan_count: 0,
            last_scanned: None,
            origin: ComponentOrigin::Manufactured,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn component_type_roundtrip() {
        for ct in ComponentType::ALL {
            assert_eq!(ct.code().parse::<ComponentType>().unwrap(), ct);
        }
        assert!("XYZ".parse::<ComponentType>().is_err());
    }

    #[test]
    fn component_type_parse_is_case_insensitive() {
        assert_eq!("erc".parse::<ComponentType>().unwrap(), ComponentType::Erc);
        assert_eq!(" rpd ".parse::<ComponentType>().unwrap(), ComponentType::Rpd);
    }

    #[test]
    fn component_type_serde_uses_codes() {
        let json = serde_json::to_string(&ComponentType::Lnr).unwrap();
        assert_eq!(json, "\"LNR\"");
        let back: ComponentType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ComponentType::Lnr);
    }

    #[test]
    fn status_roundtrip() {
        for s in [
            ComponentStatus::Active,
            ComponentStatus::Inactive,
            ComponentStatus::Replaced,
            ComponentStatus::Damaged,
        ] {
            assert_eq!(s.as_str().parse::<ComponentStatus>().unwrap(), s);
        }
        assert!("Broken".parse::<ComponentStatus>().is_err());
    }

    #[test]
    fn component_ids_are_unique_and_parseable() {
        let id1 = ComponentId::new();
        let id2 = ComponentId::new();
        assert_ne!(id1, id2);
        assert_eq!(id1.to_string().parse::<ComponentId>().unwrap(), id1);
    }

    #[test]
    fn note_scan_increments_and_tracks_latest() {
        let mut c = sample();
        let t1 = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap();

        c.note_scan(t2);
        assert_eq!(c.scan_count, 1);
        assert_eq!(c.last_scanned, Some(t2));

        // Out-of-order arrival must not move last_scanned backwards.
        c.note_scan(t1);
        assert_eq!(c.scan_count, 2);
        assert_eq!(c.last_scanned, Some(t2));
    }

    #[test]
    fn default_warranty_by_type() {
        assert_eq!(ComponentType::Erc.default_warranty_months(), 60);
        assert_eq!(ComponentType::Rpd.default_warranty_months(), 48);
        assert_eq!(ComponentType::Lnr.default_warranty_months(), 72);
    }

    #[test]
    fn component_serde_roundtrip() {
        let c = sample();
        let json = serde_json::to_string(&c).unwrap();
        let back: Component = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
