//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `DONATION_DATA_DIR` - Directory holding `users.txt`, `requests.txt` and
//!   `items.txt`. When unset the shell runs purely in memory.
//! - `DONATION_DEMO_DATA` - `true`/`1` loads the demo accounts and requests
//!   into an empty ledger (default: false)
//! - `RUST_LOG` - Log filter (default: `donation_desk_cli=info`)
//!
//! A `.env` file in the working directory is honoured. Command-line flags
//! override the environment.

use std::path::PathBuf;

use thiserror::Error;

const DATA_DIR_VAR: &str = "DONATION_DATA_DIR";
const DEMO_DATA_VAR: &str = "DONATION_DEMO_DATA";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Resolved CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Flat-file data directory, if persistence is wanted.
    pub data_dir: Option<PathBuf>,
    /// Seed the demo fixture set into an empty ledger.
    pub demo_data: bool,
}

impl CliConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `DONATION_DEMO_DATA` is not a boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `DONATION_DEMO_DATA` is not a boolean.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup(DATA_DIR_VAR)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        let demo_data = match lookup(DEMO_DATA_VAR) {
            Some(value) => parse_bool(DEMO_DATA_VAR, &value)?,
            None => false,
        };
        Ok(Self {
            data_dir,
            demo_data,
        })
    }

    /// Apply command-line overrides. Flags win over the environment.
    #[must_use]
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, demo_data: bool) -> Self {
        if data_dir.is_some() {
            self.data_dir = data_dir;
        }
        self.demo_data |= demo_data;
        self
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got `{other}`"),
        )),
    }
}
