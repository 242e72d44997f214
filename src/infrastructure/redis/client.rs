//! Hookable Redis client handle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use redis::aio::MultiplexedConnection;
use redis::{AsyncConnectionConfig, Client, Cmd, FromRedisValue};
use tokio::sync::RwLock;
use tracing::Instrument;

use crate::error::DataError;
use crate::infrastructure::hooks::{run_after, run_before, QueryEvent, QueryHook, SharedHook};

use super::RedisOptions;

struct Inner {
    client: Client,
    options: RedisOptions,
    /// Multiplexed connection, shared across tasks and clones
    connection: RwLock<Option<Cached>>,
    /// Generation handed to the next dialed connection
    next_generation: AtomicU64,
    closed: AtomicBool,
}

#[derive(Clone)]
struct Cached {
    generation: u64,
    conn: MultiplexedConnection,
}

/// Redis client with command hooks.
///
/// Cloning is cheap; clones share the connection and the closed flag.
/// The connection is opened on first use and re-opened after it drops.
#[derive(Clone)]
pub struct RedisClient {
    inner: Arc<Inner>,
    hooks: Arc<Vec<SharedHook>>,
}

impl RedisClient {
    /// Build a client from parsed options. Does not touch the network.
    pub fn new(options: RedisOptions) -> Result<Self, DataError> {
        let client = Client::open(options.connection_info.clone())?;

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                options,
                connection: RwLock::new(None),
                next_generation: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
            hooks: Arc::new(Vec::new()),
        })
    }

    pub fn add_hook(&mut self, hook: Arc<dyn QueryHook>) {
        Arc::make_mut(&mut self.hooks).push(hook);
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn options(&self) -> &RedisOptions {
        &self.inner.options
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Get the shared connection, dialing if none exists.
    async fn connection(&self) -> Result<Cached, DataError> {
        if self.is_closed() {
            return Err(DataError::Closed);
        }

        {
            let conn = self.inner.connection.read().await;
            if let Some(ref c) = *conn {
                return Ok(c.clone());
            }
        }

        let mut conn_guard = self.inner.connection.write().await;

        // A close that finished while we waited must not get a fresh connection
        if self.is_closed() {
            return Err(DataError::Closed);
        }

        // Double-check in case another task connected while we waited
        if let Some(ref c) = *conn_guard {
            return Ok(c.clone());
        }

        let options = &self.inner.options;
        let config = AsyncConnectionConfig::new()
            .set_connection_timeout(options.dial_timeout)
            .set_response_timeout(options.response_timeout());

        let conn = self
            .inner
            .client
            .get_multiplexed_async_connection_with_config(&config)
            .await?;
        let cached = Cached {
            generation: self.inner.next_generation.fetch_add(1, Ordering::Relaxed),
            conn,
        };
        *conn_guard = Some(cached.clone());
        tracing::debug!(
            url = %options.redacted_url(),
            generation = cached.generation,
            "Redis connection established"
        );
        Ok(cached)
    }

    /// Drop the cached connection if it is still the one that failed.
    async fn evict(&self, generation: u64) {
        let mut conn_guard = self.inner.connection.write().await;
        if conn_guard.as_ref().is_some_and(|c| c.generation == generation) {
            conn_guard.take();
        }
    }

    /// Run a command through the hooks.
    pub async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T, DataError> {
        let mut event = QueryEvent::new(command_name(cmd));
        run_before(&self.hooks, &mut event);

        let result: Result<T, DataError> = async {
            let Cached {
                generation,
                mut conn,
            } = self.connection().await?;
            match cmd.query_async(&mut conn).await {
                Ok(value) => Ok(value),
                Err(e) => {
                    if e.is_connection_dropped() || e.is_io_error() || e.is_timeout() {
                        // Next call re-dials
                        self.evict(generation).await;
                    }
                    Err(DataError::Redis(e))
                }
            }
        }
        .instrument(event.span())
        .await;

        event.finish(&result);
        run_after(&self.hooks, &event);
        result
    }

    pub async fn ping(&self) -> Result<(), DataError> {
        self.query::<String>(&redis::cmd("PING")).await.map(|_| ())
    }

    /// Close the client and drop its connection. A second close reports
    /// [`DataError::Closed`].
    pub async fn close(&self) -> Result<(), DataError> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Err(DataError::Closed);
        }
        self.inner.connection.write().await.take();
        tracing::info!(url = %self.inner.options.redacted_url(), "Redis client closed");
        Ok(())
    }
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient")
            .field("url", &self.inner.options.redacted_url())
            .field("hooks", &self.hooks.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn command_name(cmd: &Cmd) -> String {
    match cmd.args_iter().next() {
        Some(redis::Arg::Simple(name)) => String::from_utf8_lossy(name).into_owned(),
        _ => "UNKNOWN".to_string(),
    }
}
