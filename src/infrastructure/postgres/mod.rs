//! PostgreSQL persistence module.
//!
//! Provides the hookable [`Database`] handle, its initializer and a
//! liveness probe.

mod database;
mod dsn;
mod health;
pub mod pool;

pub use database::Database;
pub use dsn::{mask_dsn, new_dsn, DSN_PARAMS};
pub use health::check_postgres;
pub use pool::{new_postgres, PostgresInit};
