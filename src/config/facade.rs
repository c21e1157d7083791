//! Configuration loader facade over the merge policy and sources.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::QueueConfig;
use crate::error::QueueError;
use config::{Config, ConfigError, File};
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace from every source.
    pub fn load(workspace_root: &Path) -> Result<QueueConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: QueueConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace_root = %workspace_root.display(),
            batch_get = config.cache.batch_get,
            batch_forward = config.cache.batch_forward,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration from a single file, ignoring every other source.
    pub fn load_from_file(path: &Path) -> Result<QueueConfig, ConfigError> {
        Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }

    /// Render the default configuration as TOML, e.g. to seed a workspace file.
    pub fn default_toml() -> Result<String, QueueError> {
        toml::to_string_pretty(&QueueConfig::default())
            .map_err(|e| QueueError::ConfigError(format!("Failed to render config: {}", e)))
    }
}
