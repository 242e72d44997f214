//! Redis initializer.

use std::sync::Arc;

use tracing::{Instrument, Span};

use crate::config::RedisConfig;
use crate::error::DataError;
use crate::infrastructure::cleanup::Cleanup;
use crate::infrastructure::hooks::TracingQueryHook;

use super::{RedisClient, RedisOptions};

/// Parse the URL, build the client, attach the tracing hook and ping.
///
/// Unlike the relational initializer this fails fast: without a confirmed
/// connection the caller gets neither client nor cleanup. Dial and ping
/// together are bounded by the dial timeout; the timer belongs to the
/// awaited future and is released on every exit path.
pub async fn new_redis(
    config: &RedisConfig,
    log: &Span,
) -> Result<(RedisClient, Cleanup), DataError> {
    let options = RedisOptions::parse(&config.dsn)?;
    let span = tracing::info_span!(parent: log, "new_redis", func = "new_redis");

    let dial_timeout = options.dial_timeout;
    let db_name = options.db().to_string();

    let mut client = RedisClient::new(options)?;
    client.add_hook(Arc::new(TracingQueryHook::new("redis").with_db_name(db_name)));

    match tokio::time::timeout(dial_timeout, client.ping())
        .instrument(span.clone())
        .await
    {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(DataError::ping(e)),
        Err(_) => return Err(DataError::ping(DataError::DeadlineExceeded)),
    }

    tracing::info!(
        parent: &span,
        url = %client.options().redacted_url(),
        dial_timeout_ms = dial_timeout.as_millis() as u64,
        "Redis client connected"
    );

    let closer = client.clone();
    let cleanup = Cleanup::new(&span, move || async move { closer.close().await });

    Ok((client, cleanup))
}
