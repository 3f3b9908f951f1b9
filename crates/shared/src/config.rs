//! Application configuration management.

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Payment gateway configuration.
    pub gateway: GatewayConfig,
    /// Real-time event bus configuration.
    #[serde(default)]
    pub events: EventsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as read from configuration sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key shared with the token issuer.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Payment gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Gateway API base URL.
    #[serde(default = "default_gateway_base_url")]
    pub base_url: String,
    /// Secret key used for API calls and webhook signatures.
    pub secret_key: String,
    /// Where the gateway redirects the payer after checkout.
    #[serde(default)]
    pub callback_url: Option<String>,
    /// ISO 4217 code wallets are denominated in.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_gateway_base_url() -> String {
    "https://api.paystack.co".to_string()
}

fn default_currency() -> String {
    "NGN".to_string()
}

/// Real-time event bus configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Capacity of the broadcast channel; slow subscribers lag past it.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    1024
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if configuration cannot be loaded.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CAMPUSPAY").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Currency wallets are denominated in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a code the gateway does not settle in.
    pub fn currency(&self) -> AppResult<Currency> {
        self.gateway.currency.parse().map_err(AppError::Config)
    }

    /// Access token lifetime in whole minutes.
    #[must_use]
    pub fn access_token_expires_minutes(&self) -> i64 {
        i64::try_from(self.jwt.access_token_expiry_secs / 60).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("CAMPUSPAY__DATABASE__URL", Some("postgres://localhost/campuspay_test")),
                ("CAMPUSPAY__JWT__SECRET", Some("jwt-secret")),
                ("CAMPUSPAY__GATEWAY__SECRET_KEY", Some("sk_test_123")),
                ("RUN_MODE", Some("test")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/campuspay_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.jwt.secret, "jwt-secret");
                assert_eq!(config.gateway.secret_key, "sk_test_123");
                assert_eq!(config.gateway.base_url, "https://api.paystack.co");
                assert_eq!(config.currency().unwrap(), Currency::Ngn);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.events.channel_capacity, 1024);
                assert_eq!(config.access_token_expires_minutes(), 15);
            },
        );
    }

    #[test]
    fn test_missing_gateway_secret_fails() {
        temp_env::with_vars(
            [
                ("CAMPUSPAY__DATABASE__URL", Some("postgres://localhost/campuspay_test")),
                ("CAMPUSPAY__JWT__SECRET", Some("jwt-secret")),
                ("CAMPUSPAY__GATEWAY__SECRET_KEY", None),
                ("RUN_MODE", Some("test")),
            ],
            || {
                assert!(matches!(AppConfig::load(), Err(AppError::Config(_))));
            },
        );
    }

    #[test]
    fn test_unknown_currency_is_config_error() {
        temp_env::with_vars(
            [
                ("CAMPUSPAY__DATABASE__URL", Some("postgres://localhost/campuspay_test")),
                ("CAMPUSPAY__JWT__SECRET", Some("jwt-secret")),
                ("CAMPUSPAY__GATEWAY__SECRET_KEY", Some("sk_test_123")),
                ("CAMPUSPAY__GATEWAY__CURRENCY", Some("XXX")),
                ("RUN_MODE", Some("test")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                let err = config.currency().unwrap_err();
                assert_eq!(err.error_code(), "CONFIG_ERROR");
            },
        );
    }
}
