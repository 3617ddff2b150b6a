/*!
 * Engine Configuration
 * Environment-driven settings for the authorizer and registry
 *
 * Environment variables:
 * - ABAC_CANDIDATE_SCOPE: `global` (default) or `resource_owner`
 * - ABAC_CACHE_CAPACITY: decision cache entries, `0` disables (default: 10000)
 * - ABAC_CACHE_TTL_MS: decision cache TTL in milliseconds (default: 5000)
 * - ABAC_AUDIT: record every decision (default: true)
 * - ABAC_MAX_CONDITION_DEPTH: composite nesting limit (default: 16)
 * - ABAC_TRACE_JSON: JSON log output (default: false)
 */

use crate::core::limits::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL, DEFAULT_MAX_CONDITION_DEPTH};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_CANDIDATE_SCOPE: &str = "ABAC_CANDIDATE_SCOPE";
pub const ENV_CACHE_CAPACITY: &str = "ABAC_CACHE_CAPACITY";
pub const ENV_CACHE_TTL_MS: &str = "ABAC_CACHE_TTL_MS";
pub const ENV_AUDIT: &str = "ABAC_AUDIT";
pub const ENV_MAX_CONDITION_DEPTH: &str = "ABAC_MAX_CONDITION_DEPTH";
pub const ENV_TRACE_JSON: &str = "ABAC_TRACE_JSON";

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}")]
    #[diagnostic(code(config::invalid), help("Unset the variable to use the default."))]
    Invalid { key: &'static str, value: String },
}

/// Which stored policies are candidates for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateScope {
    /// Every policy governing the access type
    #[default]
    Global,
    /// Only policies owned by the resource's owner
    ResourceOwner,
}

impl FromStr for CandidateScope {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(CandidateScope::Global),
            "resource_owner" | "owner" => Ok(CandidateScope::ResourceOwner),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    pub candidate_scope: CandidateScope,
    /// Zero disables the decision cache
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub audit: bool,
    pub max_condition_depth: usize,
    pub trace_json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidate_scope: CandidateScope::Global,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
            audit: true,
            max_condition_depth: DEFAULT_MAX_CONDITION_DEPTH,
            trace_json: false,
        }
    }
}

impl EngineConfig {
    /// Read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, falling back to defaults for missing keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let candidate_scope = match lookup(ENV_CANDIDATE_SCOPE) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: ENV_CANDIDATE_SCOPE,
                value: raw,
            })?,
            None => defaults.candidate_scope,
        };

        let cache_capacity =
            parse_or(&lookup, ENV_CACHE_CAPACITY, defaults.cache_capacity, str::parse::<usize>)?;
        let cache_ttl = parse_or(&lookup, ENV_CACHE_TTL_MS, defaults.cache_ttl, |raw| {
            raw.parse().map(Duration::from_millis)
        })?;
        let audit = parse_or(&lookup, ENV_AUDIT, defaults.audit, parse_flag)?;
        let max_condition_depth = parse_or(
            &lookup,
            ENV_MAX_CONDITION_DEPTH,
            defaults.max_condition_depth,
            |raw| match raw.parse::<usize>() {
                Ok(0) => Err(()),
                Ok(depth) => Ok(depth),
                Err(_) => Err(()),
            },
        )?;
        let trace_json = parse_or(&lookup, ENV_TRACE_JSON, defaults.trace_json, parse_flag)?;

        Ok(Self {
            candidate_scope,
            cache_capacity,
            cache_ttl,
            audit,
            max_condition_depth,
            trace_json,
        })
    }

    pub fn with_candidate_scope(mut self, scope: CandidateScope) -> Self {
        self.candidate_scope = scope;
        self
    }

    pub fn with_cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache_capacity = capacity;
        self.cache_ttl = ttl;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache_capacity = 0;
        self
    }

    pub fn with_audit(mut self, audit: bool) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_max_condition_depth(mut self, depth: usize) -> Self {
        self.max_condition_depth = depth;
        self
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_capacity > 0
    }
}

fn parse_or<F, T, P, E>(lookup: &F, key: &'static str, default: T, parse: P) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Result<T, E>,
{
    match lookup(key) {
        Some(raw) => parse(raw.trim()).map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Result<bool, ()> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(()),
    }
}
