//! Integration tests for layered configuration loading

use contact_queue::config::{ConfigLoader, QueueConfig};
use std::fs;
use tempfile::TempDir;

use crate::integration::test_utils::{env_lock, EnvGuard};

const ENV_KEYS: &[&str] = &[
    "XDG_CONFIG_HOME",
    "CONTACT_QUEUE_ENV",
    "CONTACT_QUEUE__CACHE__BATCH_GET",
    "CONTACT_QUEUE__ELIGIBILITY__ENFORCED",
];

fn isolated_env() -> (EnvGuard, TempDir) {
    let guard = EnvGuard::capture(ENV_KEYS);
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
    let config_home = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", config_home.path());
    (guard, config_home)
}

#[test]
fn test_defaults_without_any_file() {
    let _lock = env_lock();
    let (_guard, _config_home) = isolated_env();
    let workspace = TempDir::new().unwrap();

    let config = QueueConfig::load(workspace.path()).unwrap();
    assert_eq!(config, QueueConfig::default());
}

#[test]
fn test_sources_override_in_order() {
    let _lock = env_lock();
    let (_guard, config_home) = isolated_env();
    let workspace = TempDir::new().unwrap();

    let user_dir = config_home.path().join("contact-queue");
    fs::create_dir_all(&user_dir).unwrap();
    fs::write(
        user_dir.join("config.toml"),
        "[cache]\nbatch_get = 40\nbatch_forward = 20\n\n[eligibility]\nstart_hour = 8\n",
    )
    .unwrap();
    fs::write(
        workspace.path().join("contact-queue.toml"),
        "[cache]\nbatch_forward = 10\n\n[backoff]\nmax_ms = 3000\n",
    )
    .unwrap();
    std::env::set_var("CONTACT_QUEUE__CACHE__BATCH_GET", "30");
    std::env::set_var("CONTACT_QUEUE__ELIGIBILITY__ENFORCED", "false");

    let config = QueueConfig::load(workspace.path()).unwrap();
    assert_eq!(config.cache.batch_get, 30);
    assert_eq!(config.cache.batch_forward, 10);
    assert_eq!(config.backoff.baseline_ms, 200);
    assert_eq!(config.backoff.max_ms, 3000);
    assert_eq!(config.eligibility.start_hour, 8);
    assert_eq!(config.eligibility.end_hour, 21);
    assert!(!config.eligibility.enforced);
}

#[test]
fn test_environment_specific_workspace_file() {
    let _lock = env_lock();
    let (_guard, _config_home) = isolated_env();
    let workspace = TempDir::new().unwrap();

    fs::write(
        workspace.path().join("contact-queue.toml"),
        "[eligibility]\nend_hour = 20\n",
    )
    .unwrap();
    fs::write(
        workspace.path().join("contact-queue.staging.toml"),
        "[eligibility]\nend_hour = 18\n",
    )
    .unwrap();

    std::env::set_var("CONTACT_QUEUE_ENV", "staging");
    let config = QueueConfig::load(workspace.path()).unwrap();
    assert_eq!(config.eligibility.end_hour, 18);
}

#[test]
fn test_invalid_values_are_rejected() {
    let _lock = env_lock();
    let (_guard, _config_home) = isolated_env();
    let workspace = TempDir::new().unwrap();

    fs::write(
        workspace.path().join("contact-queue.toml"),
        "[cache]\nbatch_get = 10\nbatch_forward = 25\n\n[eligibility]\nstart_hour = 30\n",
    )
    .unwrap();

    let err = QueueConfig::load(workspace.path()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("batch_forward"), "{}", message);
    assert!(message.contains("Invalid start hour: 30"), "{}", message);
}

#[test]
fn test_default_toml_lists_every_section() {
    let rendered = ConfigLoader::default_toml().unwrap();
    for section in ["[cache]", "[backoff]", "[eligibility]", "[logging]"] {
        assert!(rendered.contains(section), "missing {} in:\n{}", section, rendered);
    }
    assert!(rendered.contains("batch_get = 50"));
    assert!(rendered.contains("max_ms = 5000"));
}
