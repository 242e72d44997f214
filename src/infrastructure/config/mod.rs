mod settings;

pub use settings::{DatabaseConfig, OtelConfig, RedisConfig, ServerConfig, Settings};
