use railtag_store::StoreError;
use railtag_types::ScanId;

/// Errors surfaced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The input itself is unusable. Nothing was recorded.
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A scanned code resolved to no component. The observation was still
    /// ledgered; `scan_id` identifies the recorded orphan event.
    #[error("unrecognized QR code {code} (recorded as scan {scan_id})")]
    UnknownCode { code: String, scan_id: ScanId },

    /// The operation collides with existing state (duplicate identity,
    /// disallowed lifecycle transition).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A transient store failure that persisted through the internal retry.
    #[error("store busy: {0}")]
    TransientStore(String),

    /// The store cannot be reached at all.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A failure that indicates a bug or corrupt data, not a caller mistake.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ComponentNotFound(id) => Self::NotFound(format!("component {id}")),
            StoreError::DuplicateQrCode(code) => Self::Conflict(format!("QR code exists: {code}")),
            StoreError::DuplicateComponentId(id) => {
                Self::Conflict(format!("component id exists: {id}"))
            }
            StoreError::InvalidTransition { from, to } => {
                Self::Conflict(format!("invalid status transition: {from} -> {to}"))
            }
            StoreError::Timeout(msg) => Self::TransientStore(msg),
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use railtag_types::ComponentStatus;

    #[test]
    fn store_errors_map_to_the_taxonomy() {
        let e: LedgerError = StoreError::ComponentNotFound("x".into()).into();
        assert!(matches!(e, LedgerError::NotFound(_)));

        let e: LedgerError = StoreError::DuplicateQrCode("c".into()).into();
        assert!(matches!(e, LedgerError::Conflict(_)));

        let e: LedgerError = StoreError::InvalidTransition {
            from: ComponentStatus::Inactive,
            to: ComponentStatus::Damaged,
        }
        .into();
        assert!(matches!(e, LedgerError::Conflict(_)));

        let e: LedgerError = StoreError::Timeout("busy".into()).into();
        assert!(matches!(e, LedgerError::TransientStore(_)));

        let e: LedgerError = StoreError::Unavailable("gone".into()).into();
        assert!(matches!(e, LedgerError::StoreUnavailable(_)));

        let e: LedgerError = StoreError::Serialization("bad json".into()).into();
        assert!(matches!(e, LedgerError::Internal(_)));
    }
}
