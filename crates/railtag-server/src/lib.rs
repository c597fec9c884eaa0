//! HTTP server for Railtag.
//!
//! A thin axum layer over [`railtag_ledger::LedgerService`]: JSON in, JSON
//! out, with ledger errors mapped onto HTTP status codes. Store selection
//! (durable SQLite with in-memory fallback) happens once at startup.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ServerError, ServerResult};
pub use handler::AppState;
pub use server::RailtagServer;
