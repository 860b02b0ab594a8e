//! Service-level configuration

use anyhow::Result;

/// Where revoked token ids are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationBackend {
    /// Process memory, forgotten on restart
    Memory,
    /// Redis, shared between instances and kept across restarts
    Redis,
}

/// Catalog service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub server_address: String,
    /// Externally reachable base URL, used in confirmation links
    pub public_url: String,
    /// Whether authenticated requests check the revocation registry
    pub blacklist_enabled: bool,
    pub revocation_backend: RevocationBackend,
    /// Path of the filter allow-list file, extension optional
    pub filters_config: String,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SERVER_ADDRESS`: Bind address (default: "0.0.0.0:3000")
    /// - `PUBLIC_URL`: Base URL of confirmation links (default: "http://localhost:3000")
    /// - `JWT_BLACKLIST_ENABLED`: Check revoked tokens (default: true)
    /// - `REVOCATION_BACKEND`: "memory" or "redis" (default: "memory")
    /// - `FILTERS_CONFIG`: Filter allow-list file (default: "conf/filters")
    pub fn from_env() -> Result<Self> {
        let server_address =
            std::env::var("SERVER_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let public_url =
            std::env::var("PUBLIC_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let blacklist_enabled = match std::env::var("JWT_BLACKLIST_ENABLED") {
            Ok(value) => parse_flag(&value).ok_or_else(|| {
                anyhow::anyhow!("JWT_BLACKLIST_ENABLED must be true or false, got {}", value)
            })?,
            Err(_) => true,
        };

        let revocation_backend = match std::env::var("REVOCATION_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => RevocationBackend::Memory,
            "redis" => RevocationBackend::Redis,
            other => anyhow::bail!("Unknown REVOCATION_BACKEND {}", other),
        };

        let filters_config =
            std::env::var("FILTERS_CONFIG").unwrap_or_else(|_| "conf/filters".to_string());

        Ok(AppConfig {
            server_address,
            public_url,
            blacklist_enabled,
            revocation_backend,
            filters_config,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
