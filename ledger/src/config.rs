//! Configuration for the ledger

use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Optimistic-concurrency retry policy
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
        }
    }
}

/// Retry policy for optimistic-concurrency conflicts
///
/// A losing writer re-runs its whole read-compute-commit cycle up to
/// `max_attempts` times, sleeping `backoff_ms` between attempts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum read-compute-commit cycles per operation
    pub max_attempts: u32,

    /// Fixed delay between attempts (milliseconds)
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 100,
        }
    }
}

impl Config {
    /// Load from TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(attempts) = std::env::var("LEDGER_RETRY_MAX_ATTEMPTS") {
            config.retry.max_attempts = attempts
                .parse()
                .map_err(|_| crate::Error::Config(format!("Invalid max attempts: {}", attempts)))?;
        }

        if let Ok(backoff) = std::env::var("LEDGER_RETRY_BACKOFF_MS") {
            config.retry.backoff_ms = backoff
                .parse()
                .map_err(|_| crate::Error::Config(format!("Invalid backoff: {}", backoff)))?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(crate::Error::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
