//! Liveness probe for the relational handle.

use std::sync::Arc;

use futures::FutureExt;

use crate::infrastructure::probe::{HealthCheck, ProbeContext};

use super::Database;

/// Wrap `db` in a probe that pings on every call, bounded by the caller's
/// context.
pub fn check_postgres(db: Database) -> HealthCheck {
    Arc::new(move |ctx: ProbeContext| {
        let db = db.clone();
        async move { ctx.run(db.ping()).await }.boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use std::time::Duration;

    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_cancelled_probe_returns_promptly() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_secs(30))
            .connect_lazy("postgres://app@10.255.255.1:5432/app")
            .unwrap();
        let probe = check_postgres(Database::new(pool, "app"));

        let ctx = ProbeContext::background();
        ctx.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), probe(ctx))
            .await
            .expect("probe blocked on a cancelled context");
        assert!(matches!(result, Err(DataError::Canceled)));
    }
}
