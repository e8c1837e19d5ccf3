//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use slmwatch_broker::KiteConfig;
use slmwatch_watcher::WatcherConfig;
use std::path::Path;

/// Env var holding the Kite session access token.
pub const ACCESS_TOKEN_ENV: &str = "SLMWATCH_KITE_ACCESS_TOKEN";

/// Env var overriding the Kite API key.
pub const API_KEY_ENV: &str = "SLMWATCH_KITE_API_KEY";

/// Broker selection and connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Use the deterministic fake broker instead of the live API.
    /// Default: false.
    #[serde(default)]
    pub mock_orders: bool,
    /// Kite Connect settings (ignored when `mock_orders` is set).
    #[serde(flatten)]
    pub kite: KiteConfig,
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between watch invocations per order (ms). Default: 5,000.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Stop once no watch is running and the queue is empty. Default: false.
    #[serde(default)]
    pub exit_when_idle: bool,
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            exit_when_idle: false,
        }
    }
}

/// Watcher queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum pending successor jobs. Default: 256.
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

/// Account the watched orders belong to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Broker user id (for logs and successor jobs).
    #[serde(default)]
    pub user_id: String,
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Watcher configuration. See `WatcherConfig` for the
    /// `watch_manual_cancellations` hazard.
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub account: AccountConfig,
}

impl AppConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist, then apply environment credentials.
    pub fn load(path: &str) -> AppResult<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Read broker credentials from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            self.broker.kite.access_token = token;
        }
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.broker.kite.api_key = key;
        }
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> AppResult<()> {
        if self.scheduler.poll_interval_ms == 0 {
            return Err(AppError::Config(
                "scheduler.poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.queue.capacity == 0 {
            return Err(AppError::Config("queue.capacity must be positive".to_string()));
        }
        if !self.broker.mock_orders {
            if self.broker.kite.api_key.is_empty() {
                return Err(AppError::Config(format!(
                    "broker.api_key (or {API_KEY_ENV}) is required when mock_orders is off"
                )));
            }
            if self.broker.kite.access_token.is_empty() {
                return Err(AppError::Config(format!(
                    "{ACCESS_TOKEN_ENV} is required when mock_orders is off"
                )));
            }
        }
        Ok(())
    }
}
