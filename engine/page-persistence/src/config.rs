//! Configuration for the page persistence layer

use crate::error::{PersistenceError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for environment variable overrides, e.g. `PAGE_PERSISTENCE_WORKER__THREAD_NAME`
pub const ENV_PREFIX: &str = "PAGE_PERSISTENCE";

/// Smallest stack the worker thread may be given
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// Configuration for the page persistence layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Worker thread configuration
    pub worker: WorkerConfig,

    /// On-disk storage configuration for the bundled adaptors
    pub storage: StorageConfig,
}

/// Worker thread configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Name given to the worker thread
    pub thread_name: String,

    /// Stack size for the worker thread (platform default if unset)
    pub stack_size: Option<usize>,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Whether to write indented JSON
    pub pretty_json: bool,

    /// Whether to fsync every file before renaming it into place
    pub fsync_every_write: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { thread_name: "page-persistence".to_string(), stack_size: None }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            pretty_json: true,
            fsync_every_write: false, // Balance between performance and durability
        }
    }
}

impl PersistenceConfig {
    /// Load configuration from an optional TOML file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            tracing::debug!("Loading persistence configuration from file: {:?}", path);
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: PersistenceConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.worker.thread_name.trim().is_empty() {
            return Err(PersistenceError::config("worker thread_name must not be empty"));
        }

        if let Some(stack_size) = self.worker.stack_size {
            if stack_size < MIN_STACK_SIZE {
                return Err(PersistenceError::config(format!(
                    "worker stack_size must be at least {MIN_STACK_SIZE} bytes, got {stack_size}"
                )));
            }
        }

        Ok(())
    }
}
