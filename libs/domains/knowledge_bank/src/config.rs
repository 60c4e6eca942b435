//! Client-side options for [`BatchManager`](crate::BatchManager).

use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};
use grpc_client::ChannelConfig;

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Connection and call options used by the batch manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerOptions {
    /// Per-call deadline. `None` leaves calls unbounded.
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
    /// Zstd on requests and accepted on responses.
    pub compression: bool,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            compression: true,
        }
    }
}

impl FromEnv for ManagerOptions {
    /// Reads `KBS_TIMEOUT_MS`, `KBS_CONNECT_TIMEOUT_MS` and `KBS_COMPRESSION`.
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_ms: i64 = env_parse_or("KBS_TIMEOUT_MS", -1)?;
        let connect_timeout_ms = env_parse_or("KBS_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT_MS)?;
        let compression = env_or_default("KBS_COMPRESSION", "true");

        Ok(Self {
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms as u64)),
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            compression: compression != "false" && compression != "0",
        })
    }
}

impl ManagerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn without_compression(mut self) -> Self {
        self.compression = false;
        self
    }

    /// Channel settings for these options. The deadline is applied per call, not here.
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig::default().with_connect_timeout(self.connect_timeout)
    }
}
