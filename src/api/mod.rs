//! API layer - health endpoints for orchestrators.

mod health;
mod routes;

pub use health::{live, ready, CheckResponse, LivenessResponse, NotReady, ReadinessResponse};
pub use routes::api_routes;
