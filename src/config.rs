// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Identifiers that only some routes need (app id, developer API key) are
//! optional here and checked when a request actually needs them.

use std::env;

/// Default developer portal base URL (World ID cloud verification and payments).
pub const DEFAULT_DEVELOPER_API_URL: &str = "https://developer.worldcoin.org";

/// Default World Chain JSON-RPC endpoint used for smart-wallet signature checks.
pub const DEFAULT_RPC_URL: &str = "https://worldchain-mainnet.g.alchemy.com/public";

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// True when running in production (cookies get the Secure flag)
    pub production: bool,
    /// Mini-app identifier (`app_...`), required for proof verification
    pub app_id: Option<String>,
    /// Default signal when the client omits one
    pub world_id_signal: Option<String>,
    /// Developer portal API key, required for payment confirmation
    pub dev_portal_api_key: Option<String>,
    /// Developer portal base URL
    pub developer_api_url: String,
    /// JSON-RPC endpoint for ERC-1271 checks
    pub rpc_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Which user store to connect
    pub database_backend: DatabaseBackend,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 8080,
        };

        let database_backend = match env::var("DATABASE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "firestore" => DatabaseBackend::Firestore,
            "memory" => DatabaseBackend::Memory,
            other => return Err(ConfigError::Invalid("DATABASE_BACKEND", other.to_string())),
        };

        Ok(Self {
            port,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            production: env::var("APP_ENV")
                .map(|v| v.trim().eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            app_id: optional_var("APP_ID"),
            world_id_signal: optional_var("WORLD_ID_SIGNAL"),
            dev_portal_api_key: optional_var("DEV_PORTAL_API_KEY"),
            developer_api_url: optional_var("DEVELOPER_API_URL")
                .unwrap_or_else(|| DEFAULT_DEVELOPER_API_URL.to_string()),
            rpc_url: optional_var("WORLDCHAIN_RPC_URL")
                .unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            database_backend,
        })
    }

    /// Config for tests: in-memory store, local URLs, every identifier set.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:3000".to_string(),
            production: false,
            app_id: Some("app_staging_test".to_string()),
            world_id_signal: None,
            dev_portal_api_key: Some("test_api_key".to_string()),
            developer_api_url: "http://127.0.0.1:9".to_string(),
            rpc_url: "http://127.0.0.1:9".to_string(),
            gcp_project_id: "test-project".to_string(),
            database_backend: DatabaseBackend::Memory,
        }
    }
}

/// Read a variable, treating blank values as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("APP_ID", "  app_123  ");
        env::set_var("APP_ENV", "Production");
        env::set_var("DATABASE_BACKEND", "memory");
        env::set_var("DEV_PORTAL_API_KEY", "");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.app_id.as_deref(), Some("app_123"));
        assert!(config.production);
        assert_eq!(config.database_backend, DatabaseBackend::Memory);
        assert_eq!(config.dev_portal_api_key, None);
        assert_eq!(config.developer_api_url, DEFAULT_DEVELOPER_API_URL);

        env::remove_var("APP_ID");
        env::remove_var("APP_ENV");
        env::remove_var("DATABASE_BACKEND");
        env::remove_var("DEV_PORTAL_API_KEY");
    }
}
