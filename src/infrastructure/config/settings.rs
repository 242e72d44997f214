use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Flat variable names accepted on top of the `__`-separated ones.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("database.dsn", "DATABASE_DSN"),
    ("redis.dsn", "REDIS_DSN"),
    ("server.host", "SERVER_HOST"),
    ("server.port", "SERVER_PORT"),
    ("otel.enabled", "OTEL_ENABLED"),
    ("otel.endpoint", "OTEL_ENDPOINT"),
    ("otel.service_name", "OTEL_SERVICE_NAME"),
    ("otel.sampling_ratio", "OTEL_SAMPLING_RATIO"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Relational store connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Driver connection string, passed through to sqlx unchanged.
    pub dsn: String,
    /// Pool size cap
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Acquire timeout in seconds; bounds the startup ping as well
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

/// Cache connection settings.
///
/// The DSN is a redis URL; `dial_timeout`, `read_timeout` and `write_timeout`
/// may be given as query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_dsn")]
    pub dsn: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    /// Export spans over OTLP
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Trace sampling ratio (0.0-1.0)
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    6
}

fn default_redis_dsn() -> String {
    "redis://localhost:6379/0".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "store-bootstrap".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8081)?
            .set_default("redis.dsn", "redis://localhost:6379/0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.connect_timeout_seconds", 6)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Nested keys: DATABASE__MAX_CONNECTIONS, SERVER__HOST, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true),
            );

        for (key, var) in ENV_OVERRIDES {
            builder = builder.set_override_option(*key, env::var(var).ok())?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DatabaseConfig {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            max_connections: default_max_connections(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl RedisConfig {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self { dsn: dsn.into() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            dsn: default_redis_dsn(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
