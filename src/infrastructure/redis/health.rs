//! Liveness probe for the cache client.

use std::sync::Arc;

use futures::FutureExt;

use crate::infrastructure::probe::{HealthCheck, ProbeContext};

use super::RedisClient;

/// Wrap `client` in a probe suitable for periodic polling.
///
/// Each call pings once under the caller's context. The probe keeps no
/// state, so concurrent calls only share the client's connection.
pub fn check_redis(client: RedisClient) -> HealthCheck {
    Arc::new(move |ctx: ProbeContext| {
        let client = client.clone();
        async move { ctx.run(client.ping()).await }.boxed()
    })
}
