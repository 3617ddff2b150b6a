/*!
 * Environment-driven configuration
 */

use abac_kernel::config::{
    ENV_AUDIT, ENV_CACHE_CAPACITY, ENV_CACHE_TTL_MS, ENV_CANDIDATE_SCOPE, ENV_MAX_CONDITION_DEPTH,
    ENV_TRACE_JSON,
};
use abac_kernel::{CandidateScope, ConfigError, EngineConfig};
use serial_test::serial;
use std::env;
use std::time::Duration;

const ALL: [&str; 6] = [
    ENV_AUDIT,
    ENV_CACHE_CAPACITY,
    ENV_CACHE_TTL_MS,
    ENV_CANDIDATE_SCOPE,
    ENV_MAX_CONDITION_DEPTH,
    ENV_TRACE_JSON,
];

fn clear() {
    for key in ALL {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear();
    let config = EngineConfig::from_env().unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.candidate_scope, CandidateScope::Global);
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear();
    env::set_var(ENV_CANDIDATE_SCOPE, "owner");
    env::set_var(ENV_CACHE_CAPACITY, "32");
    env::set_var(ENV_CACHE_TTL_MS, "1500");
    env::set_var(ENV_AUDIT, "no");
    env::set_var(ENV_MAX_CONDITION_DEPTH, "8");

    let config = EngineConfig::from_env().unwrap();
    clear();

    assert_eq!(config.candidate_scope, CandidateScope::ResourceOwner);
    assert_eq!(config.cache_capacity, 32);
    assert_eq!(config.cache_ttl, Duration::from_millis(1500));
    assert!(!config.audit);
    assert_eq!(config.max_condition_depth, 8);
    assert!(config.cache_enabled());
}

#[test]
#[serial]
fn test_invalid_environment_value() {
    clear();
    env::set_var(ENV_MAX_CONDITION_DEPTH, "0");
    let err = EngineConfig::from_env().unwrap_err();
    clear();

    assert!(matches!(
        err,
        ConfigError::Invalid { key, ref value } if key == ENV_MAX_CONDITION_DEPTH && value == "0"
    ));
}
