//! Liveness and readiness endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

use crate::probe::ProbeContext;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checked_at: DateTime<Utc>,
    pub checks: BTreeMap<String, CheckResponse>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Readiness failure; rendered as 503 with the per-store results.
#[derive(Debug)]
pub struct NotReady(pub ReadinessResponse);

impl IntoResponse for NotReady {
    fn into_response(self) -> Response {
        let failed: Vec<&str> = self
            .0
            .checks
            .iter()
            .filter(|(_, c)| !c.healthy)
            .map(|(name, _)| name.as_str())
            .collect();
        tracing::warn!(failed = ?failed, "Readiness check failed");

        (StatusCode::SERVICE_UNAVAILABLE, Json(self.0)).into_response()
    }
}

pub async fn live(State(state): State<AppState>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Run every registered probe concurrently under one deadline.
pub async fn ready(State(state): State<AppState>) -> Result<Json<ReadinessResponse>, NotReady> {
    let ctx = ProbeContext::with_timeout(state.probe_timeout);

    let results = join_all(state.checks.iter().map(|(name, check)| {
        let ctx = ctx.clone();
        async move { (name.clone(), check(ctx).await) }
    }))
    .await;

    let mut all_healthy = true;
    let checks = results
        .into_iter()
        .map(|(name, result)| {
            all_healthy &= result.is_ok();
            let check = CheckResponse {
                healthy: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
            };
            (name, check)
        })
        .collect();

    let response = ReadinessResponse {
        status: if all_healthy { "ready" } else { "unavailable" }.to_string(),
        checked_at: Utc::now(),
        checks,
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err(NotReady(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use futures::FutureExt;
    use tower::ServiceExt;

    use crate::error::DataError;
    use crate::probe::HealthCheck;
    use crate::server::create_app;

    fn ok_check() -> HealthCheck {
        Arc::new(|_ctx: ProbeContext| async { Ok::<(), DataError>(()) }.boxed())
    }

    fn failing_check() -> HealthCheck {
        Arc::new(|_ctx: ProbeContext| async { Err::<(), _>(DataError::Closed) }.boxed())
    }

    fn hanging_check() -> HealthCheck {
        Arc::new(|ctx: ProbeContext| {
            async move { ctx.run(futures::future::pending::<Result<(), DataError>>()).await }.boxed()
        })
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = create_app(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_live_always_ok() {
        let state = AppState::new(vec![("redis".to_string(), failing_check())]);
        let (status, body) = get(state, "/health/live").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_ready_when_all_checks_pass() {
        let state = AppState::new(vec![
            ("postgres".to_string(), ok_check()),
            ("redis".to_string(), ok_check()),
        ]);
        let (status, body) = get(state, "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["checks"]["redis"]["healthy"], true);
        assert!(body["checks"]["redis"].get("error").is_none());
    }

    #[tokio::test]
    async fn test_not_ready_reports_failing_store() {
        let state = AppState::new(vec![
            ("postgres".to_string(), ok_check()),
            ("redis".to_string(), failing_check()),
        ]);
        let (status, body) = get(state, "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
        assert_eq!(body["checks"]["postgres"]["healthy"], true);
        assert_eq!(body["checks"]["redis"]["error"], "handle is closed");
    }

    #[tokio::test]
    async fn test_hanging_probe_is_cut_by_deadline() {
        let state = AppState::new(vec![("redis".to_string(), hanging_check())])
            .with_probe_timeout(Duration::from_millis(50));
        let (status, body) = get(state, "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["redis"]["error"], "deadline exceeded");
    }
}
