//! Storage backends for Railtag.
//!
//! The [`ComponentStore`] trait is the boundary the ledger service works
//! against. Two implementations:
//!
//! - [`SqliteStore`] — the durable backend, SQLite via sqlx in WAL mode
//! - [`MemoryStore`] — an in-process fallback for demo and offline use
//!
//! Both satisfy the same consistency contract (see [`ComponentStore`]), so a
//! deployment can degrade to the fallback without behavioral surprises.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

use std::sync::Arc;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ComponentFilter, ComponentStore, PageOf, PageRequest, ReportOutcome};

/// Open the durable store at `database_url`, falling back to the in-memory
/// store when no URL is configured or the connection fails. The fallback is
/// logged loudly; data written to it does not survive a restart.
pub async fn open_store(database_url: Option<&str>) -> Arc<dyn ComponentStore> {
    match database_url {
        None => {
            tracing::warn!("no database url configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
        Some(url) => match SqliteStore::connect(url).await {
            Ok(store) => {
                tracing::info!(url, "connected to sqlite store");
                Arc::new(store)
            }
            Err(err) => {
                tracing::warn!(
                    url,
                    error = %err,
                    "durable store unavailable, falling back to in-memory store"
                );
                Arc::new(MemoryStore::new())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_url_yields_memory_backend() {
        let store = open_store(None).await;
        assert_eq!(store.backend_name(), "memory");
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_url_falls_back() {
        let store = open_store(Some("sqlite:///nonexistent-dir/deeper/railtag.db")).await;
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn good_url_yields_sqlite_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("railtag.db").display());
        let store = open_store(Some(&url)).await;
        assert_eq!(store.backend_name(), "sqlite");
        store.ping().await.unwrap();
    }
}
