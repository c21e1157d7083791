//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources win: defaults, then the user file, then the workspace file, then
//! the environment.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("cache.batch_get", 50)?
        .set_default("cache.batch_forward", 25)?
        .set_default("backoff.baseline_ms", 200)?
        .set_default("backoff.max_ms", 5000)?
        .set_default("eligibility.start_hour", 9)?
        .set_default("eligibility.end_hour", 21)?
        .set_default("eligibility.enforced", true)
}
