use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::component::ComponentId;
use crate::error::TypeError;

/// Unique identifier for a scan event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(Uuid);

impl ScanId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ScanId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| TypeError::InvalidId(e.to_string()))
    }
}

/// Opaque key-value bag describing the scanning device.
///
/// Validated for size and shape only, never for semantic content. Ordering
/// is irrelevant; a `BTreeMap` keeps serialization deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceInfo(BTreeMap<String, String>);

impl DeviceInfo {
    pub const MAX_ENTRIES: usize = 32;
    pub const MAX_KEY_LEN: usize = 64;
    pub const MAX_VALUE_LEN: usize = 256;

    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a raw map, enforcing the size/shape limits.
    pub fn validated(map: BTreeMap<String, String>) -> Result<Self, TypeError> {
        if map.len() > Self::MAX_ENTRIES {
            return Err(TypeError::OversizedDeviceInfo(format!(
                "{} entries exceeds the limit of {}",
                map.len(),
                Self::MAX_ENTRIES
            )));
        }
        for (key, value) in &map {
            if key.is_empty() || key.len() > Self::MAX_KEY_LEN {
                return Err(TypeError::OversizedDeviceInfo(format!(
                    "key {key:?} is empty or longer than {} bytes",
                    Self::MAX_KEY_LEN
                )));
            }
            if value.len() > Self::MAX_VALUE_LEN {
                return Err(TypeError::OversizedDeviceInfo(format!(
                    "value for key {key:?} exceeds {} bytes",
                    Self::MAX_VALUE_LEN
                )));
            }
        }
        Ok(Self(map))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

/// One field observation of a QR code. Immutable once created; the scan
/// ledger is append-only and never drops an observation, even when the code
/// could not be resolved (an orphan scan).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub id: ScanId,
    /// Unset for orphan scans.
    pub component_id: Option<ComponentId>,
    pub qr_code: String,
    pub scanned_by: String,
    pub location: Option<String>,
    pub device_info: DeviceInfo,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub scan_timestamp: DateTime<Utc>,
    pub processing_time_ms: Option<u64>,
    /// Set when decode or lookup failed.
    pub error_message: Option<String>,
}

impl ScanEvent {
    pub fn is_orphan(&self) -> bool {
        self.component_id.is_none()
    }
}
