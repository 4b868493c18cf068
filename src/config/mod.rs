//! # Configuration Module
//!
//! This module handles loading and validating configuration from
//! environment variables. All settings are centralized here.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = AppConfig::from_env()?;
//! println!("Listening on {}:{}", config.server_host, config.server_port);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SERVER_HOST` | HTTP server host | `127.0.0.1` |
//! | `SERVER_PORT` | HTTP server port | `8080` |
//! | `SIDESHIFT_API_URL` | Swap provider base URL | `https://sideshift.ai/api/v2` |
//! | `SIDESHIFT_API_KEY` | Provider secret; unset enables the mock provider | *(unset)* |
//! | `SIDESHIFT_AFFILIATE_ID` | Affiliate tag sent with shift orders | `ciphervault` |
//! | `DEMO_MODE` | Force the mock swap provider | `false` |
//! | `VAULT_TTL_HOURS` | Default vault lifetime | `72` |
//! | `PROPOSAL_TTL_HOURS` | Pending proposal lifetime | `24` |
//! | `SWEEP_INTERVAL` | Self-destruct sweep period (seconds) | `60` |

use std::env;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    /// Failed to parse a value
    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

/// Application configuration loaded from environment variables.
///
/// Every setting has a workable default; the service boots with an empty
/// environment and runs fully in mock mode.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // ==========================================
    // SERVER SETTINGS
    // ==========================================
    /// HTTP server host address.
    ///
    /// Use `127.0.0.1` for localhost only, `0.0.0.0` to accept
    /// connections from any interface.
    pub server_host: String,

    /// HTTP server port number.
    pub server_port: u16,

    // ==========================================
    // SWAP PROVIDER SETTINGS
    // ==========================================
    /// Base URL of the SideShift-compatible swap API.
    pub sideshift_api_url: String,

    /// Provider API secret. When unset, all shifts are served by the
    /// deterministic mock provider instead of the network.
    pub sideshift_api_key: Option<String>,

    /// Affiliate id attached to every created shift order.
    pub sideshift_affiliate_id: String,

    /// Force the mock swap provider even when an API key is configured.
    pub demo_mode: bool,

    // ==========================================
    // LIFECYCLE SETTINGS
    // ==========================================
    /// Default vault lifetime in hours when a request doesn't specify one.
    pub vault_ttl_hours: i64,

    /// Lifetime of a pending unlock proposal in hours.
    pub proposal_ttl_hours: i64,

    /// How often the self-destruct sweeper runs (in seconds).
    pub sweep_interval: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Use `dotenvy::dotenv()` before calling this to load from a `.env`
    /// file.
    ///
    /// ## Returns
    ///
    /// - `Ok(AppConfig)` - Configuration loaded successfully
    /// - `Err(ConfigError)` - A variable has an unparseable value
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            server_host: get_env_or_default("SERVER_HOST", "127.0.0.1"),
            server_port: get_env_or_default("SERVER_PORT", "8080")
                .parse()
                .map_err(|e| {
                    ConfigError::ParseError("SERVER_PORT".to_string(), format!("{}", e))
                })?,

            // Swap provider
            sideshift_api_url: get_env_or_default(
                "SIDESHIFT_API_URL",
                "https://sideshift.ai/api/v2",
            ),
            sideshift_api_key: env::var("SIDESHIFT_API_KEY").ok().filter(|k| !k.is_empty()),
            sideshift_affiliate_id: get_env_or_default("SIDESHIFT_AFFILIATE_ID", "ciphervault"),
            demo_mode: parse_bool("DEMO_MODE", false)?,

            // Lifecycle
            vault_ttl_hours: get_env_or_default("VAULT_TTL_HOURS", "72")
                .parse()
                .unwrap_or(72),
            proposal_ttl_hours: get_env_or_default("PROPOSAL_TTL_HOURS", "24")
                .parse()
                .unwrap_or(24),
            sweep_interval: get_env_or_default("SWEEP_INTERVAL", "60")
                .parse()
                .unwrap_or(60),
        })
    }

    /// Whether shift orders should be served by the mock provider.
    ///
    /// True when demo mode is forced or no API key is configured.
    pub fn use_mock_shifts(&self) -> bool {
        self.demo_mode || self.sideshift_api_key.is_none()
    }

    /// A fixed configuration for unit tests: mock provider, short TTLs.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            sideshift_api_url: "http://localhost:9".to_string(),
            sideshift_api_key: None,
            sideshift_affiliate_id: "ciphervault-test".to_string(),
            demo_mode: true,
            vault_ttl_hours: 72,
            proposal_ttl_hours: 24,
            sweep_interval: 60,
        }
    }
}

/// Get an environment variable with a default value.
///
/// Returns the default if the variable is not set.
fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean environment variable ("true"/"false"/"1"/"0").
fn parse_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            other => Err(ConfigError::InvalidValue(
                key.to_string(),
                other.to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_or_default() {
        // Should return default when not set
        let value = get_env_or_default("NONEXISTENT_VAR_12345", "default_value");
        assert_eq!(value, "default_value");
    }

    #[test]
    fn test_parse_bool_default() {
        assert!(!parse_bool("NONEXISTENT_BOOL_12345", false).unwrap());
        assert!(parse_bool("NONEXISTENT_BOOL_12345", true).unwrap());
    }

    #[test]
    fn test_use_mock_shifts() {
        let mut config = AppConfig::for_tests();
        assert!(config.use_mock_shifts());

        config.demo_mode = false;
        config.sideshift_api_key = Some("secret".to_string());
        assert!(!config.use_mock_shifts());

        // Demo mode wins over a configured key
        config.demo_mode = true;
        assert!(config.use_mock_shifts());
    }
}
