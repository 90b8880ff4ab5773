//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration. Without it only the in-process cache is used.
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    /// Balance cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Retry policy for mutating transactions.
    #[serde(default)]
    pub retry: RetryConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
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
    /// Upper bound for a single HTTP request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServerConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_request_timeout() -> u64 {
    30
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
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    8
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    5
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL, e.g. `redis://localhost:6379/0`.
    pub url: String,
}

/// Balance cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum entries held by the in-process layer.
    #[serde(default = "default_local_capacity")]
    pub local_capacity: u64,
    /// Time-to-live of in-process entries in seconds.
    #[serde(default = "default_local_ttl")]
    pub local_ttl_secs: u64,
    /// Time-to-live of shared (Redis) entries in seconds.
    #[serde(default = "default_shared_ttl")]
    pub shared_ttl_secs: u64,
    /// Upper bound for a coalesced balance load in milliseconds.
    #[serde(default = "default_load_timeout")]
    pub load_timeout_ms: u64,
    /// Upper bound for a single cache call in milliseconds.
    #[serde(default = "default_op_timeout")]
    pub op_timeout_ms: u64,
}

impl CacheConfig {
    /// Returns the coalesced load timeout.
    #[must_use]
    pub const fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Returns the bound on a single cache call.
    #[must_use]
    pub const fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            local_capacity: default_local_capacity(),
            local_ttl_secs: default_local_ttl(),
            shared_ttl_secs: default_shared_ttl(),
            load_timeout_ms: default_load_timeout(),
            op_timeout_ms: default_op_timeout(),
        }
    }
}

fn default_local_capacity() -> u64 {
    1024
}

fn default_local_ttl() -> u64 {
    60
}

fn default_shared_ttl() -> u64 {
    3600
}

fn default_load_timeout() -> u64 {
    5_000
}

fn default_op_timeout() -> u64 {
    250
}

/// Which failures the retry coordinator repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryScope {
    /// Every failure is retried until the budget runs out.
    #[default]
    AnyError,
    /// Only serialization conflicts are retried.
    ConflictOnly,
}

/// Retry policy for mutating transactions.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// First backoff interval in milliseconds.
    #[serde(default = "default_initial_interval")]
    pub initial_interval_ms: u64,
    /// Largest backoff interval in milliseconds.
    #[serde(default = "default_max_interval")]
    pub max_interval_ms: u64,
    /// Total retry budget in milliseconds.
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed_ms: u64,
    /// Failures that are retried.
    #[serde(default)]
    pub scope: RetryScope,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: default_initial_interval(),
            max_interval_ms: default_max_interval(),
            max_elapsed_ms: default_max_elapsed(),
            scope: RetryScope::default(),
        }
    }
}

fn default_initial_interval() -> u64 {
    200
}

fn default_max_interval() -> u64 {
    1_000
}

fn default_max_elapsed() -> u64 {
    5_000
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret used to verify bearer tokens.
    pub secret: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("WALLETD").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment_applies_defaults() {
        temp_env::with_vars(
            [
                ("WALLETD__DATABASE__URL", Some("postgres://localhost/wallets")),
                ("WALLETD__JWT__SECRET", Some("secret")),
                ("WALLETD__RETRY__SCOPE", Some("conflict_only")),
            ],
            || {
                let config = AppConfig::load().unwrap();

                assert_eq!(config.database.url, "postgres://localhost/wallets");
                assert_eq!(config.database.max_connections, 8);
                assert_eq!(config.server.port, 8081);
                assert!(config.redis.is_none());
                assert_eq!(config.cache.local_capacity, 1024);
                assert_eq!(config.cache.load_timeout(), Duration::from_secs(5));
                assert_eq!(config.cache.op_timeout(), Duration::from_millis(250));
                assert_eq!(config.retry.initial_interval_ms, 200);
                assert_eq!(config.retry.scope, RetryScope::ConflictOnly);
                assert!(!config.log.json);
            },
        );
    }

    #[test]
    fn test_load_fails_without_database() {
        temp_env::with_vars(
            [
                ("WALLETD__DATABASE__URL", None::<&str>),
                ("WALLETD__JWT__SECRET", Some("secret")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
