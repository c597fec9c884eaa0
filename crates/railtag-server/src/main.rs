use tracing_subscriber::EnvFilter;

use railtag_server::{RailtagServer, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let server = RailtagServer::from_config(config).await;
    server.serve().await?;
    Ok(())
}
