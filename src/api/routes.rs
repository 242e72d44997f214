use axum::{routing::get, Router};

use crate::server::AppState;

use super::health::{live, ready};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
}
