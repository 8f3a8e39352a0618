//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `SHOPFRONT__*` environment variables
//! (e.g. `SHOPFRONT__SERVER__BIND_ADDRESS`,
//! `SHOPFRONT__ACCOUNTS__JWT__ACCESS_SECRET`).

use std::path::Path;
use std::time::Duration;

use accounts_core::AccountsConfig;
use serde::Deserialize;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShopfrontConfig {
    pub server: ServerConfig,
    pub accounts: AccountsConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Add `Secure` to the refresh-token cookie. Disable only for plain-HTTP
    /// development.
    pub secure_cookies: bool,
    /// Include the underlying error text in 500 responses
    pub expose_internal_errors: bool,
    /// Accept `role: "admin"` on public registration
    pub allow_admin_registration: bool,
    pub rate_limit_per_window: u32,
    pub rate_limit_window_seconds: u64,
}

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            secure_cookies: true,
            expose_internal_errors: false,
            allow_admin_registration: true,
            rate_limit_per_window: 100,
            rate_limit_window_seconds: 15 * 60,
        }
    }
}

impl ServerConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "shopfront=info,accounts_core=info,catalog_core=info,tower_http=info"
                .to_string(),
            json: false,
        }
    }
}

impl ShopfrontConfig {
    /// Load defaults, then `path` if given, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix("SHOPFRONT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
