//! Instrumentation hooks run around every operation issued through a
//! [`Database`](crate::postgres::Database) or
//! [`RedisClient`](crate::redis::RedisClient).
//!
//! - `DebugQueryHook`: human-readable statement logging
//! - `TracingQueryHook`: one `db.query` span per operation, exported to
//!   OpenTelemetry by the telemetry layer

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::field::Empty;
use tracing::Span;

/// A single operation as seen by the hooks.
#[derive(Debug)]
pub struct QueryEvent {
    /// Statement text (SQL) or command name (Redis)
    pub query: String,
    pub started_at: Instant,
    /// Filled in before `after_query` runs
    pub error: Option<String>,
    span: Option<Span>,
}

impl QueryEvent {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            started_at: Instant::now(),
            error: None,
            span: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Span the operation should run inside, if a hook opened one.
    pub fn span(&self) -> Span {
        self.span.clone().unwrap_or_else(Span::none)
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = Some(span);
    }

    pub(crate) fn finish<T, E: std::fmt::Display>(&mut self, result: &Result<T, E>) {
        if let Err(e) = result {
            self.error = Some(e.to_string());
        }
    }
}

/// Callback pair run before and after each operation.
///
/// `before_query` may attach a span to the event; the operation is then
/// instrumented with it.
pub trait QueryHook: Send + Sync + 'static {
    fn before_query(&self, event: &mut QueryEvent);

    fn after_query(&self, event: &QueryEvent);
}

pub type SharedHook = Arc<dyn QueryHook>;

/// Run `before_query` for every hook, in registration order.
pub(crate) fn run_before(hooks: &[SharedHook], event: &mut QueryEvent) {
    for hook in hooks {
        hook.before_query(event);
    }
}

/// Run `after_query` for every hook, in reverse registration order.
pub(crate) fn run_after(hooks: &[SharedHook], event: &QueryEvent) {
    for hook in hooks.iter().rev() {
        hook.after_query(event);
    }
}

/// Logs statements as they complete.
///
/// In verbose mode every statement is logged at DEBUG; failures are always
/// logged at WARN.
#[derive(Debug, Clone)]
pub struct DebugQueryHook {
    verbose: bool,
}

impl DebugQueryHook {
    pub fn new() -> Self {
        Self { verbose: true }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for DebugQueryHook {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryHook for DebugQueryHook {
    fn before_query(&self, _event: &mut QueryEvent) {}

    fn after_query(&self, event: &QueryEvent) {
        let elapsed_ms = event.elapsed().as_secs_f64() * 1000.0;
        match &event.error {
            Some(error) => {
                tracing::warn!(query = %event.query, elapsed_ms, error = %error, "query failed");
            }
            None if self.verbose => {
                tracing::debug!(query = %event.query, elapsed_ms, "query");
            }
            None => {}
        }
    }
}

/// Emits a client span per operation tagged with the store and database name.
#[derive(Debug, Clone)]
pub struct TracingQueryHook {
    system: &'static str,
    db_name: String,
}

impl TracingQueryHook {
    pub fn new(system: &'static str) -> Self {
        Self {
            system,
            db_name: String::new(),
        }
    }

    pub fn with_db_name(mut self, name: impl Into<String>) -> Self {
        self.db_name = name.into();
        self
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

impl QueryHook for TracingQueryHook {
    fn before_query(&self, event: &mut QueryEvent) {
        let span = tracing::info_span!(
            "db.query",
            otel.kind = "client",
            otel.status_code = Empty,
            db.system = self.system,
            db.name = %self.db_name,
            db.statement = %event.query,
            error = Empty,
        );
        event.set_span(span);
    }

    fn after_query(&self, event: &QueryEvent) {
        let span = event.span();
        match &event.error {
            Some(error) => {
                span.record("otel.status_code", "ERROR");
                span.record("error", error.as_str());
            }
            None => {
                span.record("otel.status_code", "OK");
            }
        }
    }
}
