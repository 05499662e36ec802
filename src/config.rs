use std::time::Duration;

use serde::Deserialize;

use crate::error::{PoolError, Result};

/// Number of warmed instances a pool keeps ready unless told otherwise.
pub const DEFAULT_TARGET_SIZE: usize = 30;

/// Upper bound on target size. Each ready instance is a fully built object, so anything past this is
/// almost certainly a typo in a config file.
pub const MAX_TARGET_SIZE: usize = 65_536;

pub const DEFAULT_THREAD_NAME: &str = "warmup-replenisher";

/// Configuration options for WarmUpPool and SharedWarmUpPool
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Number of warmed instances to keep ready
    pub target_size: usize,

    /// How long SharedWarmUpPool::acquire waits for the replenisher when the buffer is empty before
    /// building an instance on the caller's thread. Zero means never wait.
    pub acquire_timeout_ms: u64,

    /// Name given to the SharedWarmUpPool replenisher thread
    pub thread_name: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            target_size: DEFAULT_TARGET_SIZE,
            acquire_timeout_ms: 0,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl PoolConfig {
    /// Parse a YAML document. Missing fields take their defaults. Negative or fractional sizes are
    /// rejected rather than clamped.
    pub fn from_yaml(s: &str) -> Result<PoolConfig> {
        let config: PoolConfig = serde_yaml::from_str(s)?;
        config.validate()?;

        Ok(config)
    }

    pub fn with_target_size(mut self, target_size: usize) -> Self {
        self.target_size = target_size;
        self
    }

    /// Sub-millisecond remainders round up so a non-zero timeout never turns into "never wait". Durations
    /// past u64::MAX milliseconds saturate.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        let mut ms = timeout.as_millis();
        if timeout.subsec_nanos() % 1_000_000 != 0 {
            ms += 1;
        }
        self.acquire_timeout_ms = u64::try_from(ms).unwrap_or(u64::MAX);
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        check_target_size(self.target_size)
    }
}

pub(crate) fn check_target_size(n: usize) -> Result<()> {
    if n > MAX_TARGET_SIZE {
        return Err(PoolError::InvalidTargetSize {
            requested: n,
            max: MAX_TARGET_SIZE,
        });
    }

    Ok(())
}
