use config::{Config, ConfigError, Environment};
use mdm_shared::{bootstrap, topics};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::orchestrator::OrchestratorConfig;

/// Runtime configuration, read from `MDM_BOOTSTRAP_*` environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Address the ingest listener binds to
    #[serde(default = "default_ingest_addr")]
    pub ingest_addr: String,

    /// Consumer identity for the authenticate subscription
    #[serde(default = "default_consumer_name")]
    pub consumer_name: String,

    /// Topic carrying authenticate check-ins
    #[serde(default = "default_authenticate_topic")]
    pub authenticate_topic: String,

    /// Topic push requests are published to
    #[serde(default = "default_push_topic")]
    pub push_topic: String,

    /// Delay between a successful batch and its push, in milliseconds
    #[serde(default = "default_push_delay_ms")]
    pub push_delay_ms: u64,

    /// Upper bound on delayed pushes waiting to fire
    #[serde(default = "default_max_pending_pushes")]
    pub max_pending_pushes: usize,

    /// Commands kept per device before the oldest are dropped
    #[serde(default = "default_max_queued_per_device")]
    pub max_queued_per_device: usize,

    /// Per-subscriber channel capacity of the event feed
    #[serde(default = "default_subscription_buffer")]
    pub subscription_buffer: usize,

    /// Optional path to a bootstrap profile replacing the embedded one
    #[serde(default)]
    pub bootstrap_profile_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ingest_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_consumer_name() -> String {
    bootstrap::CONSUMER_NAME.to_string()
}

fn default_authenticate_topic() -> String {
    topics::AUTHENTICATE.to_string()
}

fn default_push_topic() -> String {
    topics::PUSH_REQUESTED.to_string()
}

fn default_push_delay_ms() -> u64 {
    bootstrap::PUSH_DELAY_MS
}

fn default_max_pending_pushes() -> usize {
    bootstrap::MAX_PENDING_PUSHES
}

fn default_max_queued_per_device() -> usize {
    bootstrap::MAX_QUEUED_PER_DEVICE
}

fn default_subscription_buffer() -> usize {
    100
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(Environment::with_prefix("MDM_BOOTSTRAP"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pending_pushes == 0 || self.max_pending_pushes > Semaphore::MAX_PERMITS {
            return Err(ConfigError::Message(format!(
                "max_pending_pushes must be between 1 and {}, got {}",
                Semaphore::MAX_PERMITS,
                self.max_pending_pushes
            )));
        }
        if self.max_queued_per_device == 0 {
            return Err(ConfigError::Message("max_queued_per_device must be at least 1".into()));
        }
        if self.subscription_buffer == 0 {
            return Err(ConfigError::Message("subscription_buffer must be at least 1".into()));
        }
        Ok(())
    }

    pub fn push_delay(&self) -> Duration {
        Duration::from_millis(self.push_delay_ms)
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            consumer_name: self.consumer_name.clone(),
            topic: self.authenticate_topic.clone(),
            push_delay: self.push_delay(),
            max_pending_pushes: self.max_pending_pushes,
        }
    }
}
