use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no targets configured")]
    NoTargets,

    #[error("check_interval_secs must be positive")]
    ZeroInterval,

    #[error("probe_timeout_ms must be positive")]
    ZeroTimeout,

    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitorConfig {
    pub targets: Vec<Target>,
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Target {
    pub host: String,
    #[serde(default)]
    pub ports: Vec<u16>,
}

fn default_check_interval_secs() -> u64 { 5 }
fn default_probe_timeout_ms() -> u64 { 2000 }
fn default_max_concurrency() -> usize { 256 }

impl MonitorConfig {
    /// Validate once at startup. Anything caught here keeps the process
    /// from entering the round loop; probe-level failures are never fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        if self.check_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.probe_timeout() > self.check_interval() {
            warn!(
                timeout_ms = self.probe_timeout_ms,
                interval_secs = self.check_interval_secs,
                "Probe timeout exceeds the check interval; rounds may overrun"
            );
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Total probes per round: one ping per target plus one TCP check
    /// per configured (host, port) pair.
    pub fn probe_count(&self) -> usize {
        self.targets.len() + self.targets.iter().map(|t| t.ports.len()).sum::<usize>()
    }
}
