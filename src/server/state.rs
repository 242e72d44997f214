use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::probe::HealthCheck;

/// Probe budget for one readiness request
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct AppState {
    /// Named probes run by `/health/ready`
    pub checks: Arc<Vec<(String, HealthCheck)>>,
    pub probe_timeout: Duration,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(checks: Vec<(String, HealthCheck)>) -> Self {
        Self {
            checks: Arc::new(checks),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            start_time: Instant::now(),
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}
