//! Engine configuration.

use crate::{error::Result, Batcher, Error, DEFAULT_BATCH_SIZE};
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable overriding the push chunk size.
pub const BATCH_SIZE_VAR: &str = "WORDSYNC_BATCH_SIZE";

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Tunables for a sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Records per remote-sync call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let batch_size = match var(BATCH_SIZE_VAR) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("{} must be a positive integer, got {:?}", BATCH_SIZE_VAR, raw))
            })?,
            None => DEFAULT_BATCH_SIZE,
        };

        let config = Self { batch_size };
        config.validate()?;
        Ok(config)
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// A batcher with the configured chunk size.
    pub fn batcher(&self) -> Result<Batcher> {
        Batcher::new(self.batch_size)
    }
}
