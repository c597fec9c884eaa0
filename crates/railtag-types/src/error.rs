use thiserror::Error;

use crate::component::ComponentStatus;

/// Errors produced by type parsing, validation, and transition operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown component type: {0}")]
    UnknownComponentType(String),

    #[error("unknown component status: {0}")]
    UnknownStatus(String),

    #[error("unknown report type: {0}")]
    UnknownReportType(String),

    #[error("unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("unknown resolution status: {0}")]
    UnknownResolutionStatus(String),

    #[error("unknown audit action: {0}")]
    UnknownAuditAction(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("malformed QR code {code:?}: {reason}")]
    MalformedQrCode { code: String, reason: String },

    #[error("{field} contains no usable characters")]
    EmptyCodeSegment { field: &'static str },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ComponentStatus,
        to: ComponentStatus,
    },

    #[error("device info rejected: {0}")]
    OversizedDeviceInfo(String),
}
