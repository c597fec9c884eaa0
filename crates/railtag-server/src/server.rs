use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use railtag_ledger::{LedgerOptions, LedgerService};
use railtag_store::open_store;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// The Railtag HTTP server.
pub struct RailtagServer {
    config: ServerConfig,
    ledger: Arc<LedgerService>,
}

impl RailtagServer {
    /// Wire up the store (durable with in-memory fallback) and ledger from
    /// configuration.
    pub async fn from_config(config: ServerConfig) -> Self {
        let store = open_store(config.database_url.as_deref()).await;
        let ledger = Arc::new(LedgerService::with_options(
            store,
            LedgerOptions {
                synthesize_unknown: config.synthesize_unknown_codes,
                ..Default::default()
            },
        ));
        Self::with_ledger(config, ledger)
    }

    pub fn with_ledger(config: ServerConfig, ledger: Arc<LedgerService>) -> Self {
        Self { config, ledger }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let state = AppState {
            ledger: Arc::clone(&self.ledger),
        };
        let router = build_router(state);
        if self.config.enable_cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            store = self.ledger.backend_name(),
            "railtag server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
