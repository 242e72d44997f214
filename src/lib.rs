// Infrastructure layer (store bootstrap)
pub mod infrastructure;

pub use infrastructure::cleanup;
pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::hooks;
pub use infrastructure::postgres;
pub use infrastructure::probe;
pub use infrastructure::redis;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod telemetry;
