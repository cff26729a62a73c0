//! Configuration management for the server.

use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Largest number of records accepted in one push
    pub max_push_records: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_push_records: wordsync_engine::DEFAULT_BATCH_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = var("HOST").unwrap_or(defaults.host);

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort)?,
            None => defaults.port,
        };

        let max_push_records = match var("MAX_PUSH_RECORDS") {
            Some(raw) => match raw.parse() {
                Ok(0) | Err(_) => return Err(ConfigError::InvalidMaxPushRecords),
                Ok(n) => n,
            },
            None => defaults.max_push_records,
        };

        Ok(Self {
            host,
            port,
            max_push_records,
        })
    }

    /// Address to bind, `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("MAX_PUSH_RECORDS must be a positive integer")]
    InvalidMaxPushRecords,
}
