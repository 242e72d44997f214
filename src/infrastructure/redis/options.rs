//! Redis connection URL parsing.

use std::time::Duration;

use redis::{ConnectionAddr, ConnectionInfo, IntoConnectionInfo};
use url::Url;

use crate::error::DataError;

pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(3);

const TIMEOUT_PARAMS: [&str; 3] = ["dial_timeout", "read_timeout", "write_timeout"];

/// Connection options parsed from a redis URL.
///
/// Timeout defaults when the URL does not set them:
/// - `dial_timeout`: 5s
/// - `read_timeout`: 3s
/// - `write_timeout`: same as `read_timeout`
#[derive(Debug, Clone)]
pub struct RedisOptions {
    pub connection_info: ConnectionInfo,
    pub dial_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    redacted_url: String,
}

impl RedisOptions {
    /// Parse `redis://[user][:password@]host[:port][/db][?dial_timeout=..&read_timeout=..&write_timeout=..]`.
    ///
    /// The timeout parameters are consumed here; everything else is handed to
    /// the client library's own parser. Any failure is terminal.
    pub fn parse(dsn: &str) -> Result<Self, DataError> {
        let mut url = Url::parse(dsn).map_err(|e| DataError::ParseUrl(e.to_string()))?;

        match url.scheme() {
            "redis" | "rediss" | "redis+unix" | "unix" => {}
            other => {
                return Err(DataError::ParseUrl(format!("invalid URL scheme: {other}")));
            }
        }

        let mut timeouts: [Option<Duration>; 3] = [None; 3];
        let mut passthrough = Vec::new();
        for (key, value) in url.query_pairs() {
            match TIMEOUT_PARAMS.iter().position(|p| *p == key) {
                Some(idx) => timeouts[idx] = parse_duration(&key, &value)?,
                None => passthrough.push((key.into_owned(), value.into_owned())),
            }
        }

        if passthrough.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(&passthrough);
        }

        let connection_info = url
            .as_str()
            .into_connection_info()
            .map_err(|e| DataError::ParseUrl(e.to_string()))?;

        let [dial, read, write] = timeouts;
        let read_timeout = read.unwrap_or(DEFAULT_READ_TIMEOUT);

        if url.password().is_some() {
            let _ = url.set_password(Some("***"));
        }

        Ok(Self {
            connection_info,
            dial_timeout: dial.unwrap_or(DEFAULT_DIAL_TIMEOUT),
            read_timeout,
            write_timeout: write.unwrap_or(read_timeout),
            redacted_url: url.into(),
        })
    }

    /// URL with the password replaced, for logging.
    pub fn redacted_url(&self) -> &str {
        &self.redacted_url
    }

    pub fn db(&self) -> i64 {
        self.connection_info.redis.db
    }

    pub fn addr(&self) -> &ConnectionAddr {
        &self.connection_info.addr
    }

    /// Per-command budget: a round-trip is one write plus one read.
    pub fn response_timeout(&self) -> Duration {
        self.read_timeout.max(self.write_timeout)
    }
}

/// Parse `500ms`, `3s`, `1.5s`, `2m`, `1h`, or a bare number of seconds.
/// Zero means "use the default".
fn parse_duration(key: &str, value: &str) -> Result<Option<Duration>, DataError> {
    let invalid = || DataError::ParseUrl(format!("invalid {key}: {value:?}"));

    let value = value.trim();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);

    let number: f64 = number.parse().map_err(|_| invalid())?;
    let seconds = match unit {
        "" | "s" => number,
        "ms" => number / 1_000.0,
        "us" | "µs" => number / 1_000_000.0,
        "m" => number * 60.0,
        "h" => number * 3_600.0,
        _ => return Err(invalid()),
    };

    if seconds == 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(seconds)
        .map(Some)
        .map_err(|_| invalid())
}
