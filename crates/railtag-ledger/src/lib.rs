//! The Railtag ledger service.
//!
//! Sits between the HTTP layer and the store: validates inputs, mints QR
//! identities, records scans (including orphans), files quality reports,
//! and drives the component lifecycle state machine. Transient store
//! failures are retried once internally; everything else surfaces through
//! the [`LedgerError`] taxonomy.

pub mod error;
pub mod service;
pub mod validation;

pub use error::{LedgerError, LedgerResult};
pub use service::{LedgerOptions, LedgerService, ScanOutcome};
pub use validation::{NewComponent, NewReport, ScanRequest, StatusChange};
