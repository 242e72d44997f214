//! Redis cache module
//!
//! - `RedisOptions`: URL parsing with timeout defaults
//! - `RedisClient`: hookable client handle
//! - `new_redis`: fail-fast initializer
//! - `check_redis`: reusable liveness probe

mod client;
mod health;
mod options;
pub mod pool;

pub use client::RedisClient;
pub use health::check_redis;
pub use options::{RedisOptions, DEFAULT_DIAL_TIMEOUT, DEFAULT_READ_TIMEOUT};
pub use pool::new_redis;
