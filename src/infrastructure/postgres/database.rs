//! Hookable PostgreSQL handle.

use std::future::Future;
use std::sync::Arc;

use sqlx::postgres::{PgPool, PgQueryResult, PgRow};
use sqlx::{Connection, FromRow};
use tracing::Instrument;

use crate::error::DataError;
use crate::infrastructure::hooks::{run_after, run_before, QueryEvent, QueryHook, SharedHook};

/// Pooled PostgreSQL handle with query hooks.
///
/// Rows are mapped through [`FromRow`] by column name, so columns the
/// caller's row type does not declare are discarded. Adding columns on the
/// store side never breaks existing callers.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    hooks: Arc<Vec<SharedHook>>,
    db_name: String,
}

impl Database {
    pub fn new(pool: PgPool, db_name: impl Into<String>) -> Self {
        Self {
            pool,
            hooks: Arc::new(Vec::new()),
            db_name: db_name.into(),
        }
    }

    /// Register a hook. Hooks added after the handle was cloned only apply
    /// to this copy.
    pub fn add_query_hook(&mut self, hook: Arc<dyn QueryHook>) {
        Arc::make_mut(&mut self.hooks).push(hook);
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn discards_unknown_columns(&self) -> bool {
        true
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Acquire a pooled connection and ping it.
    pub async fn ping(&self) -> Result<(), DataError> {
        self.run("PING", |pool| async move {
            let mut conn = pool.acquire().await?;
            conn.ping().await
        })
        .await
    }

    pub async fn execute(&self, sql: &str) -> Result<PgQueryResult, DataError> {
        self.run(sql, |pool| async move { sqlx::query(sql).execute(&pool).await })
            .await
    }

    pub async fn fetch_all<R>(&self, sql: &str) -> Result<Vec<R>, DataError>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.run(sql, |pool| async move {
            sqlx::query_as::<_, R>(sql).fetch_all(&pool).await
        })
        .await
    }

    pub async fn fetch_optional<R>(&self, sql: &str) -> Result<Option<R>, DataError>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.run(sql, |pool| async move {
            sqlx::query_as::<_, R>(sql).fetch_optional(&pool).await
        })
        .await
    }

    /// Close the pool. A second close reports [`DataError::Closed`].
    pub async fn close(&self) -> Result<(), DataError> {
        if self.pool.is_closed() {
            return Err(DataError::Closed);
        }
        self.pool.close().await;
        tracing::info!(db.name = %self.db_name, "PostgreSQL connection pool closed");
        Ok(())
    }

    async fn run<T, F, Fut>(&self, query: &str, op: F) -> Result<T, DataError>
    where
        F: FnOnce(PgPool) -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        if self.pool.is_closed() {
            return Err(DataError::Closed);
        }

        let mut event = QueryEvent::new(query);
        run_before(&self.hooks, &mut event);

        let result = op(self.pool.clone())
            .instrument(event.span())
            .await
            .map_err(DataError::from);

        event.finish(&result);
        run_after(&self.hooks, &event);
        result
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("db_name", &self.db_name)
            .field("hooks", &self.hooks.len())
            .field("closed", &self.pool.is_closed())
            .finish()
    }
}
