use crate::types::constants::{
    DEFAULT_API_URL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL, DEFAULT_WS_URL,
};
use crate::types::{RealtimeError, Result};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_WS_URL: &str = "ARCHIVE_WS_URL";
pub const ENV_API_URL: &str = "ARCHIVE_API_URL";
pub const ENV_AUTH_TOKEN: &str = "ARCHIVE_AUTH_TOKEN";
pub const ENV_RECONNECT_INTERVAL: &str = "ARCHIVE_WS_RECONNECT_INTERVAL_MS";
pub const ENV_MAX_RECONNECT_ATTEMPTS: &str = "ARCHIVE_WS_MAX_RECONNECT_ATTEMPTS";
pub const ENV_HEARTBEAT_INTERVAL: &str = "ARCHIVE_WS_HEARTBEAT_INTERVAL_MS";
pub const ENV_CONNECT_TIMEOUT: &str = "ARCHIVE_WS_CONNECT_TIMEOUT_MS";
pub const ENV_MAX_RECONNECT_DELAY: &str = "ARCHIVE_WS_MAX_RECONNECT_DELAY_MS";

/// Connection settings, fixed once the client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base address of the realtime server
    pub endpoint_url: String,
    /// REST base of the archive API (token endpoint)
    pub api_url: String,
    /// Bearer token for the REST API
    pub auth_token: Option<String>,
    /// Delay before the first reconnect attempt, doubled per attempt
    pub reconnect_interval_ms: u64,
    /// Consecutive reconnect attempts before giving up
    pub max_reconnect_attempts: u32,
    /// Period between pings while connected, `0` disables them
    pub heartbeat_interval_ms: u64,
    /// How long the transport may stay connecting, `None` waits forever
    pub connect_timeout_ms: Option<u64>,
    /// Upper bound for a single reconnect delay, `None` lets it grow
    pub max_reconnect_delay_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_WS_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL,
            connect_timeout_ms: Some(DEFAULT_CONNECT_TIMEOUT),
            max_reconnect_delay_ms: None,
        }
    }
}

impl ClientConfig {
    /// Reads the `ARCHIVE_*` environment variables, keeping defaults for unset ones.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let connect_timeout_ms = match get(ENV_CONNECT_TIMEOUT) {
            Some(raw) => Some(parse::<u64>(ENV_CONNECT_TIMEOUT, &raw)?).filter(|ms| *ms > 0),
            None => defaults.connect_timeout_ms,
        };

        Ok(Self {
            endpoint_url: get(ENV_WS_URL).unwrap_or(defaults.endpoint_url),
            api_url: get(ENV_API_URL).unwrap_or(defaults.api_url),
            auth_token: get(ENV_AUTH_TOKEN),
            reconnect_interval_ms: get(ENV_RECONNECT_INTERVAL)
                .map(|raw| parse(ENV_RECONNECT_INTERVAL, &raw))
                .transpose()?
                .unwrap_or(defaults.reconnect_interval_ms),
            max_reconnect_attempts: get(ENV_MAX_RECONNECT_ATTEMPTS)
                .map(|raw| parse(ENV_MAX_RECONNECT_ATTEMPTS, &raw))
                .transpose()?
                .unwrap_or(defaults.max_reconnect_attempts),
            heartbeat_interval_ms: get(ENV_HEARTBEAT_INTERVAL)
                .map(|raw| parse(ENV_HEARTBEAT_INTERVAL, &raw))
                .transpose()?
                .unwrap_or(defaults.heartbeat_interval_ms),
            connect_timeout_ms,
            max_reconnect_delay_ms: get(ENV_MAX_RECONNECT_DELAY)
                .map(|raw| parse(ENV_MAX_RECONNECT_DELAY, &raw))
                .transpose()?,
        })
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// `None` when heartbeats are disabled
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat_interval_ms > 0).then(|| Duration::from_millis(self.heartbeat_interval_ms))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn max_reconnect_delay(&self) -> Option<Duration> {
        self.max_reconnect_delay_ms.map(Duration::from_millis)
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| RealtimeError::Config(format!("{}='{}': {}", key, raw, e)))
}
