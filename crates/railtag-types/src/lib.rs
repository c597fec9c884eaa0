//! Foundation types for Railtag, the railway track-fitting component ledger.
//!
//! This crate provides the domain types shared by every other Railtag crate:
//! component identity and attributes, the durable QR code format, scan
//! events, quality reports, audit entries, daily aggregates, and the
//! component lifecycle state machine.
//!
//! # Key Types
//!
//! - [`Component`] — a single physical track fitting (clip, pad, or liner)
//! - [`QrCode`] — the durable code printed on the part; encodes type, batch,
//!   and a unique token, and re-parses without a store lookup
//! - [`ScanEvent`] — one field observation; the scan ledger is append-only
//! - [`QualityReport`] — an operator-filed defect report with derived priority
//! - [`next_status`] — the explicit lifecycle transition function
//! - [`AuditEntry`] — append-only record of every status change and filing

pub mod aggregate;
pub mod audit;
pub mod component;
pub mod error;
pub mod qr;
pub mod report;
pub mod scan;
pub mod status;

pub use aggregate::DailyAggregate;
pub use audit::{AuditAction, AuditEntry};
pub use component::{Component, ComponentId, ComponentOrigin, ComponentStatus, ComponentType};
pub use error::TypeError;
pub use qr::{QrCode, QrPayload};
pub use report::{derive_priority, QualityReport, ReportId, ReportType, ResolutionStatus, Severity};
pub use scan::{DeviceInfo, ScanEvent, ScanId};
pub use status::{next_status, StatusTrigger};
