use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Durable store location; the server falls back to the in-memory store
    /// when unset or unreachable.
    pub database_url: Option<String>,
    /// Mint placeholder components for well-formed unknown codes
    /// (demo/offline mode).
    pub synthesize_unknown_codes: bool,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            database_url: None,
            synthesize_unknown_codes: false,
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the environment, falling back to defaults.
    ///
    /// Variables: `RAILTAG_BIND_ADDR`, `RAILTAG_DATABASE_URL` (or
    /// `DATABASE_URL`), `RAILTAG_SYNTHESIZE_UNKNOWN`, `RAILTAG_ENABLE_CORS`.
    pub fn from_env() -> ServerResult<Self> {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("RAILTAG_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|e| ServerError::Config(format!("RAILTAG_BIND_ADDR: {e}")))?;
        }
        config.database_url = std::env::var("RAILTAG_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .ok();
        if let Ok(v) = std::env::var("RAILTAG_SYNTHESIZE_UNKNOWN") {
            config.synthesize_unknown_codes = parse_bool(&v, "RAILTAG_SYNTHESIZE_UNKNOWN")?;
        }
        if let Ok(v) = std::env::var("RAILTAG_ENABLE_CORS") {
            config.enable_cors = parse_bool(&v, "RAILTAG_ENABLE_CORS")?;
        }
        Ok(config)
    }
}

fn parse_bool(value: &str, var: &str) -> ServerResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ServerError::Config(format!(
            "{var}: expected a boolean, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert!(c.database_url.is_none());
        assert!(!c.synthesize_unknown_codes);
        assert!(c.enable_cors);
    }

    #[test]
    fn bool_parsing() {
        assert!(parse_bool("TRUE", "X").unwrap());
        assert!(parse_bool(" 1 ", "X").unwrap());
        assert!(!parse_bool("off", "X").unwrap());
        assert!(parse_bool("maybe", "X").is_err());
    }
}
