//! Verifier configuration
//!
//! Values are loaded from a TOML file, then overridden by `VOTY_*`
//! environment variables, then validated. The freshness tolerance and fan-out
//! limit must match what signers expect, so they live here rather than in
//! any document.

use crate::crypto::signing::{DEFAULT_SIGNING_TEMPLATE, HASH_PLACEHOLDER};
use crate::errors::{Result, VotyError};
use crate::types::Network;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "VOTY_";

/// Configuration of the authorization engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Serve the test network
    pub testnet: bool,
    /// Maximum distance between a claimed and the current snapshot
    pub snapshot_tolerance: u64,
    /// Maximum number of outstanding chain calls per request
    pub max_concurrent_chain_calls: usize,
    /// Timeout of a single chain call in milliseconds
    pub chain_call_timeout_ms: u64,
    /// Template handed to signers
    pub signing_template: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            testnet: false,
            snapshot_tolerance: 5,
            max_concurrent_chain_calls: 5,
            chain_call_timeout_ms: 10_000,
            signing_template: DEFAULT_SIGNING_TEMPLATE.to_string(),
        }
    }
}

impl VerifierConfig {
    /// Load configuration from a TOML file; missing keys take defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VotyError::config(format!("Failed to read config file: {e}")))?;
        toml::from_str(&content).map_err(|e| VotyError::config(format!("Invalid TOML: {e}")))
    }

    /// Apply `VOTY_*` environment overrides
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from `(name, value)` pairs using the `VOTY_` prefix
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "TESTNET" => self.testnet = parse_flag(&key, &value)?,
                "SNAPSHOT_TOLERANCE" => self.snapshot_tolerance = parse_number(&key, &value)?,
                "MAX_CONCURRENT_CHAIN_CALLS" => {
                    self.max_concurrent_chain_calls = parse_number(&key, &value)?;
                }
                "CHAIN_CALL_TIMEOUT_MS" => self.chain_call_timeout_ms = parse_number(&key, &value)?,
                "SIGNING_TEMPLATE" => self.signing_template = value,
                _ => tracing::debug!(%key, "ignoring unknown configuration variable"),
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_chain_calls == 0 {
            return Err(VotyError::config(
                "max_concurrent_chain_calls must be at least 1",
            ));
        }
        if self.chain_call_timeout_ms == 0 {
            return Err(VotyError::config("chain_call_timeout_ms must be positive"));
        }
        if !self.signing_template.contains(HASH_PLACEHOLDER) {
            return Err(VotyError::config(format!(
                "signing_template must contain {HASH_PLACEHOLDER}"
            )));
        }
        Ok(())
    }

    /// Network served by this process
    pub fn network(&self) -> Network {
        Network::from_testnet(self.testnet)
    }

    /// Chain call timeout as duration
    pub fn chain_call_timeout(&self) -> Duration {
        Duration::from_millis(self.chain_call_timeout_ms)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        other => Err(VotyError::config(format!("{key}: expected boolean, got {other:?}"))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| VotyError::config(format!("{key}: expected number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = VerifierConfig::default();
        assert_eq!(config.snapshot_tolerance, 5);
        assert_eq!(config.max_concurrent_chain_calls, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "testnet = true\nsnapshot_tolerance = 3").unwrap();

        let config = VerifierConfig::load_from_file(file.path()).unwrap();
        assert!(config.testnet);
        assert_eq!(config.snapshot_tolerance, 3);
        assert_eq!(config.max_concurrent_chain_calls, 5);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = VerifierConfig::default();
        config
            .merge_with_vars([
                ("VOTY_TESTNET".to_string(), "true".to_string()),
                ("VOTY_MAX_CONCURRENT_CHAIN_CALLS".to_string(), "2".to_string()),
                ("PATH".to_string(), "/usr/bin".to_string()),
            ])
            .unwrap();
        assert!(config.testnet);
        assert_eq!(config.max_concurrent_chain_calls, 2);

        let err = config
            .merge_with_vars([("VOTY_SNAPSHOT_TOLERANCE".to_string(), "five".to_string())])
            .unwrap_err();
        assert!(matches!(err, VotyError::Config { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = VerifierConfig {
            max_concurrent_chain_calls: 0,
            ..VerifierConfig::default()
        };
        assert!(config.validate().is_err());

        let config = VerifierConfig {
            signing_template: "sign me".into(),
            ..VerifierConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
