//! Escrow service configuration
//!
//! Loaded from TOML, then overlaid with `ESCROW_*` environment variables,
//! then validated:
//!
//! ```toml
//! arbiter = "ST3ARBITER"
//! default_expiry_blocks = 1008
//! max_description_len = 256
//! ```

use crate::{EscrowError, Principal, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "ESCROW_";

/// Default expiry window: one week of ten-minute blocks
pub const DEFAULT_EXPIRY_BLOCKS: u64 = 1008;

/// Default description bound, matching a 256-character ascii string
pub const DEFAULT_MAX_DESCRIPTION_LEN: usize = 256;

/// Configuration for an escrow service instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscrowConfig {
    /// Party allowed to resolve disputes and co-authorize releases.
    /// Without one, disputes cannot be resolved.
    pub arbiter: Option<Principal>,
    /// Blocks between creation and `expires_at` when the caller gives none
    pub default_expiry_blocks: u64,
    /// Maximum description length in characters
    pub max_description_len: usize,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            arbiter: None,
            default_expiry_blocks: DEFAULT_EXPIRY_BLOCKS,
            max_description_len: DEFAULT_MAX_DESCRIPTION_LEN,
        }
    }
}

impl EscrowConfig {
    /// Set the arbiter
    pub fn with_arbiter(mut self, arbiter: impl Into<Principal>) -> Self {
        self.arbiter = Some(arbiter.into());
        self
    }

    /// Set the default expiry window
    pub fn with_default_expiry_blocks(mut self, blocks: u64) -> Self {
        self.default_expiry_blocks = blocks;
        self
    }

    /// Set the description bound
    pub fn with_max_description_len(mut self, len: usize) -> Self {
        self.max_description_len = len;
        self
    }

    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EscrowConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, apply environment overrides and validate.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EscrowError::config(format!("Failed to read {}: {e}", path.display())))?;
        let mut config: EscrowConfig = toml::from_str(&content)?;
        config.merge_with_env()?;
        config.validate()?;
        tracing::debug!(path = %path.display(), ?config, "loaded escrow configuration");
        Ok(config)
    }

    /// Overlay `ESCROW_*` variables from the process environment.
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Overlay `ESCROW_*` variables from an explicit key/value source.
    ///
    /// Unknown `ESCROW_*` keys are ignored.
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match field {
                "ARBITER" => {
                    self.arbiter = if value.is_empty() {
                        None
                    } else {
                        Some(Principal::new(value))
                    };
                }
                "DEFAULT_EXPIRY_BLOCKS" => {
                    self.default_expiry_blocks = parse_field(field, value)?;
                }
                "MAX_DESCRIPTION_LEN" => {
                    self.max_description_len = parse_field(field, value)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_expiry_blocks == 0 {
            return Err(EscrowError::config(
                "Field 'default_expiry_blocks' must be at least 1 (got 0)",
            ));
        }
        if self.max_description_len == 0 {
            return Err(EscrowError::config(
                "Field 'max_description_len' must be at least 1 (got 0)",
            ));
        }
        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        EscrowError::config(format!(
            "Field '{}{field}' has invalid format: {value:?}",
            ENV_PREFIX
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EscrowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.arbiter, None);
        assert_eq!(config.default_expiry_blocks, 1008);
        assert_eq!(config.max_description_len, 256);
    }

    #[test]
    fn test_toml_partial_uses_defaults() {
        let config = EscrowConfig::from_toml_str("arbiter = \"ST3ARB\"\n").unwrap();
        assert_eq!(config.arbiter, Some(Principal::new("ST3ARB")));
        assert_eq!(config.default_expiry_blocks, DEFAULT_EXPIRY_BLOCKS);
    }

    #[test]
    fn test_toml_rejects_zero_window() {
        let err = EscrowConfig::from_toml_str("default_expiry_blocks = 0").unwrap_err();
        assert_matches!(err, EscrowError::Config { .. });
    }

    #[test]
    fn test_toml_rejects_bad_type() {
        let err = EscrowConfig::from_toml_str("max_description_len = \"long\"").unwrap_err();
        assert_matches!(err, EscrowError::Config { .. });
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EscrowConfig::default();
        config
            .merge_with_vars([
                ("ESCROW_ARBITER", "ST9JUDGE"),
                ("ESCROW_DEFAULT_EXPIRY_BLOCKS", "144"),
                ("ESCROW_UNKNOWN", "ignored"),
                ("PATH", "/usr/bin"),
            ])
            .unwrap();
        assert_eq!(config.arbiter, Some(Principal::new("ST9JUDGE")));
        assert_eq!(config.default_expiry_blocks, 144);
        assert_eq!(config.max_description_len, DEFAULT_MAX_DESCRIPTION_LEN);

        let err = config
            .merge_with_vars([("ESCROW_MAX_DESCRIPTION_LEN", "lots")])
            .unwrap_err();
        assert_matches!(err, EscrowError::Config { .. });
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_expiry_blocks = 10").unwrap();
        writeln!(file, "max_description_len = 32").unwrap();

        let config = EscrowConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.max_description_len, 32);
    }

    #[test]
    fn test_load_missing_file() {
        let missing = Path::new("/nonexistent/escrow.toml");
        let err = EscrowConfig::load_from_file(missing).unwrap_err();
        assert_matches!(err, EscrowError::Config { .. });
    }
}
