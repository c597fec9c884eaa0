use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::component::ComponentType;
use crate::error::TypeError;

/// Prefix identifying Railtag codes in the field.
const QR_PREFIX: &str = "IR";

/// Number of hex characters in the unique token segment (a UUIDv7 in simple
/// form).
const TOKEN_LEN: usize = 32;

/// The durable code printed on a physical component.
///
/// Format: `IR-<TYPE>-<MFR>-<BATCH>-<TOKEN>`. The manufacturer and batch
/// segments are sanitized to uppercase alphanumerics at mint time, so the
/// code always splits unambiguously on `-`. The token is a UUIDv7 in simple
/// form: time-ordered and globally unique, which makes the whole code unique
/// without any cross-request coordination.
///
/// A code re-parses into a [`QrPayload`] with no store lookup, which is what
/// makes orphan-scan diagnostics possible.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QrCode(String);

impl QrCode {
    /// Mint a fresh code embedding the component type, manufacturer, and
    /// batch number.
    pub fn mint(
        component_type: ComponentType,
        manufacturer: &str,
        batch_number: &str,
    ) -> Result<Self, TypeError> {
        let mfr = sanitize_segment(manufacturer, "manufacturer")?;
        let batch = sanitize_segment(batch_number, "batch_number")?;
        let token = Uuid::now_v7().simple().to_string();
        Ok(Self(format!(
            "{QR_PREFIX}-{}-{mfr}-{batch}-{token}",
            component_type.code()
        )))
    }

    /// Wrap an already-formatted code, e.g. one read back from storage.
    pub fn from_raw(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Parse the code back into its embedded fields.
    pub fn payload(&self) -> Result<QrPayload, TypeError> {
        QrPayload::parse(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for QrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fields recoverable from a QR code without a store lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrPayload {
    pub component_type: ComponentType,
    pub manufacturer_code: String,
    pub batch_code: String,
    pub token: String,
}

impl QrPayload {
    /// Parse a raw code string.
    pub fn parse(code: &str) -> Result<Self, TypeError> {
        let malformed = |reason: &str| TypeError::MalformedQrCode {
            code: code.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = code.split('-').collect();
        if parts.len() != 5 {
            return Err(malformed("expected 5 dash-separated segments"));
        }
        if parts[0] != QR_PREFIX {
            return Err(malformed("missing IR prefix"));
        }

        let component_type: ComponentType = parts[1]
            .parse()
            .map_err(|_| malformed("unrecognized component type segment"))?;

        let manufacturer_code = parts[2].to_string();
        let batch_code = parts[3].to_string();
        if manufacturer_code.is_empty() || batch_code.is_empty() {
            return Err(malformed("empty manufacturer or batch segment"));
        }

        let token = parts[4].to_string();
        if token.len() != TOKEN_LEN || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(malformed("token segment is not a 32-char hex string"));
        }

        Ok(Self {
            component_type,
            manufacturer_code,
            batch_code,
            token,
        })
    }
}

/// Sanitize a free-text field into a code segment: uppercase alphanumerics
/// only. Fails if nothing usable remains.
pub fn sanitize_segment(value: &str, field: &'static str) -> Result<String, TypeError> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if cleaned.is_empty() {
        return Err(TypeError::EmptyCodeSegment { field });
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_and_parse_roundtrip() {
        let code = QrCode::mint(ComponentType::Erc, "Tata Steel", "B1").unwrap();
        let payload = code.payload().unwrap();
        assert_eq!(payload.component_type, ComponentType::Erc);
        assert_eq!(payload.manufacturer_code, "TATASTEEL");
        assert_eq!(payload.batch_code, "B1");
        assert_eq!(payload.token.len(), 32);
    }

    #[test]
    fn minted_codes_are_unique() {
        let a = QrCode::mint(ComponentType::Rpd, "JSW", "BATCH-9").unwrap();
        let b = QrCode::mint(ComponentType::Rpd, "JSW", "BATCH-9").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn segments_with_punctuation_still_split_cleanly() {
        // Dashes and spaces in inputs must not corrupt the code structure.
        let code = QrCode::mint(ComponentType::Lnr, "L&T - Infra", "B-2025/07").unwrap();
        let payload = code.payload().unwrap();
        assert_eq!(payload.manufacturer_code, "LTINFRA");
        assert_eq!(payload.batch_code, "B202507");
    }

    #[test]
    fn blank_manufacturer_is_rejected() {
        let err = QrCode::mint(ComponentType::Erc, "---", "B1").unwrap_err();
        assert_eq!(
            err,
            TypeError::EmptyCodeSegment {
                field: "manufacturer"
            }
        );
    }

    #[test]
    fn parse_rejects_wrong_segment_count() {
        assert!(QrPayload::parse("IR-ERC-ONLY").is_err());
    }

    #[test]
    fn parse_rejects_foreign_prefix() {
        let err = QrPayload::parse(&format!("XX-ERC-M-B-{}", "0".repeat(32))).unwrap_err();
        assert!(matches!(err, TypeError::MalformedQrCode { .. }));
    }

    #[test]
    fn parse_rejects_bad_token() {
        assert!(QrPayload::parse("IR-ERC-M-B-nothex").is_err());
        assert!(QrPayload::parse(&format!("IR-ERC-M-B-{}", "z".repeat(32))).is_err());
    }

    #[test]
    fn parse_rejects_unknown_type_segment() {
        let err = QrPayload::parse(&format!("IR-ZZZ-M-B-{}", "0".repeat(32))).unwrap_err();
        assert!(matches!(err, TypeError::MalformedQrCode { .. }));
    }

    #[test]
    fn serde_is_transparent() {
        let code = QrCode::mint(ComponentType::Erc, "M", "B").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, format!("\"{}\"", code.as_str()));
    }

    #[test]
    fn tokens_are_time_ordered() {
        // UUIDv7 simple form sorts by creation time; useful for traceability.
        let a = QrCode::mint(ComponentType::Erc, "M", "B").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = QrCode::mint(ComponentType::Erc, "M", "B").unwrap();
        assert!(a.payload().unwrap().token < b.payload().unwrap().token);
    }
}
