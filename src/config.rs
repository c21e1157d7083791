//! Configuration System
//!
//! Hierarchical configuration for the contact queue: built-in defaults, an optional
//! user-level file, an optional workspace file, then `CONTACT_QUEUE__*` environment
//! overrides. Loaded values are validated before use.

use crate::eligibility::{DefaultTimezone, EligibilityPolicy};
use crate::error::{PolicyError, QueueError};
use crate::logging::LoggingConfig;
use crate::queue::{BackoffConfig, CacheConfig};
use crate::types::TimezoneOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Prefetch window sizing
    #[serde(default)]
    pub cache: CacheConfig,

    /// Stall-recovery retry delays
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Texting-hours policy and list-building flags
    #[serde(default)]
    pub eligibility: EligibilitySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Texting-hours settings for an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilitySettings {
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,

    #[serde(default = "default_end_hour")]
    pub end_hour: u32,

    #[serde(default = "default_true")]
    pub enforced: bool,

    /// Stand-in offset for contacts with no timezone; the host's local zone when unset.
    #[serde(default)]
    pub default_offset_minutes: Option<i32>,

    #[serde(default)]
    pub default_observes_dst: bool,

    /// Open sessions on the first contact matching the status filter.
    #[serde(default)]
    pub contacts_sidebar: bool,
}

fn default_start_hour() -> u32 {
    9
}

fn default_end_hour() -> u32 {
    21
}

fn default_true() -> bool {
    true
}

impl Default for EligibilitySettings {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            enforced: default_true(),
            default_offset_minutes: None,
            default_observes_dst: false,
            contacts_sidebar: false,
        }
    }
}

impl EligibilitySettings {
    pub fn policy(&self) -> Result<EligibilityPolicy, PolicyError> {
        EligibilityPolicy::new(self.start_hour, self.end_hour, self.enforced)
    }

    pub fn default_timezone(&self) -> Result<DefaultTimezone, PolicyError> {
        match self.default_offset_minutes {
            Some(minutes) => Ok(DefaultTimezone::Fixed(TimezoneOffset::new(
                minutes,
                self.default_observes_dst,
            )?)),
            None => Ok(DefaultTimezone::HostLocal),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.policy().map_err(|e| e.to_string())?;
        self.default_timezone().map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Cache(String),
    Backoff(String),
    Eligibility(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Cache(msg) => write!(f, "Cache: {}", msg),
            ValidationError::Backoff(msg) => write!(f, "Backoff: {}", msg),
            ValidationError::Eligibility(msg) => write!(f, "Eligibility: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl QueueConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.cache.validate() {
            errors.push(ValidationError::Cache(e));
        }
        if let Err(e) = self.backoff.validate() {
            errors.push(ValidationError::Backoff(e));
        }
        if let Err(e) = self.eligibility.validate() {
            errors.push(ValidationError::Eligibility(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Load from every source for `workspace_root` and validate.
    pub fn load(workspace_root: &Path) -> Result<Self, QueueError> {
        let config = ConfigLoader::load(workspace_root)?;
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            QueueError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}
