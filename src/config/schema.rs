use crate::error::ConfigError;
use crate::session::{ControllerConfig, PersistPolicy};
use crate::transport::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config and history - computed, not serialized
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Path to config.toml - computed, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_completion_marker")]
    pub completion_marker: String,
    #[serde(default = "default_failure_message")]
    pub failure_message: String,
    #[serde(default)]
    pub persist_policy: PersistPolicy,
}

fn default_completion_marker() -> String {
    "游戏已结束".into()
}

fn default_failure_message() -> String {
    "抱歉，发送消息失败，请重试".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            completion_marker: default_completion_marker(),
            failure_message: default_failure_message(),
            persist_policy: PersistPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

fn default_max_sessions() -> usize {
    crate::session::store::DEFAULT_MAX_SESSIONS
}

fn default_database_file() -> String {
    "history.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            database_file: default_database_file(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.transport.base_url).map_err(|err| {
            ConfigError::Validation(format!(
                "transport.base_url {:?} is not a URL: {err}",
                self.transport.base_url
            ))
        })?;
        if self.transport.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "transport.request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Validation(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }
        if self.session.completion_marker.trim().is_empty() {
            return Err(ConfigError::Validation(
                "session.completion_marker must not be empty".into(),
            ));
        }
        if self.store.max_sessions == 0 {
            return Err(ConfigError::Validation(
                "store.max_sessions must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            attempt_timeout: self.request_timeout(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.transport.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.transport.connect_timeout_secs)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            completion_marker: self.session.completion_marker.clone(),
            failure_message: self.session.failure_message.clone(),
            persist_policy: self.session.persist_policy,
        }
    }

    pub fn history_db_path(&self) -> PathBuf {
        self.data_dir.join(&self.store.database_file)
    }
}
