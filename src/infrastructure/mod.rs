//! Infrastructure layer modules
//!
//! This module contains the store bootstrap components:
//! - `config`: Application configuration and settings
//! - `error`: Unified error types
//! - `hooks`: Query hooks for statement logging and span emission
//! - `cleanup`: Teardown closures returned by the initializers
//! - `probe`: Probe contexts and the `HealthCheck` type
//! - `postgres`: PostgreSQL handle, initializer and probe
//! - `redis`: Redis client, initializer and probe

pub mod cleanup;
pub mod config;
pub mod error;
pub mod hooks;
pub mod postgres;
pub mod probe;
pub mod redis;

#[cfg(test)]
pub(crate) mod test_utils;
