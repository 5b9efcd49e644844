//! Configuration loading and default template generation.
//!
//! # Configuration File Format
//!
//! ```toml
//! chains_file = "chains.json"
//! chains = [5, 100]
//! rpc_tracing = false
//!
//! [signer]
//! private_key = "$FAUCET_PRIVATE_KEY"
//!
//! [bootstrap]
//! retry_interval_ms = 1000
//! ```

use std::collections::BTreeSet;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chain::RetryPolicy;
use crate::error::Error;
use crate::signer::SignerConfig;

/// Dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chain registry JSON file, relative paths resolve against the config file.
    #[serde(default = "default_chains_file")]
    pub chains_file: PathBuf,
    /// Chain ids to activate.
    #[serde(default)]
    pub chains: BTreeSet<u64>,
    /// Log every RPC request and response.
    #[serde(default)]
    pub rpc_tracing: bool,
    /// Log filter used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_level: Option<String>,
    /// Signing key material.
    #[serde(default)]
    pub signer: SignerConfig,
    /// Initial nonce retry behaviour.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// `[bootstrap]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Pause between failed initial nonce queries (default: 1000).
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Abort startup after this many failed queries on one chain (default: never).
    #[serde(default)]
    pub max_attempts: Option<NonZeroU32>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: default_retry_interval_ms(),
            max_attempts: None,
        }
    }
}

impl BootstrapConfig {
    /// The [`RetryPolicy`] described by this section.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy = RetryPolicy::forever(Duration::from_millis(self.retry_interval_ms));
        match self.max_attempts {
            Some(max) => policy.with_max_attempts(max),
            None => policy,
        }
    }
}

fn default_chains_file() -> PathBuf {
    PathBuf::from("chains.json")
}

const fn default_retry_interval_ms() -> u64 {
    1_000
}

impl Config {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not a valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::config_with("failed to parse TOML config", e))
    }

    /// Chain ids to activate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the list is empty.
    pub fn selected_chains(&self) -> Result<&BTreeSet<u64>, Error> {
        if self.chains.is_empty() {
            return Err(Error::config("no chains selected, set `chains = [...]`"));
        }
        Ok(&self.chains)
    }
}

/// Load configuration from a TOML file at the given path.
///
/// A relative `chains_file` is rebased onto the config file's directory.
///
/// # Errors
///
/// Returns an error if the file cannot be resolved, read, or parsed.
pub fn load_config(path: &Path) -> Result<Config, Error> {
    let config_path = path.canonicalize().map_err(|e| {
        Error::config_with(
            format!("failed to resolve config path '{}'", path.display()),
            e,
        )
    })?;
    let content = std::fs::read_to_string(&config_path).map_err(|e| {
        Error::config_with(
            format!("failed to read config file '{}'", config_path.display()),
            e,
        )
    })?;
    let mut config = Config::from_toml(&content)?;
    if config.chains_file.is_relative()
        && let Some(dir) = config_path.parent()
    {
        config.chains_file = dir.join(&config.chains_file);
    }
    Ok(config)
}

/// Generate a default TOML configuration template.
#[must_use]
pub fn generate_default_config() -> String {
    String::from(
        r#"# Faucet dispatcher configuration

# Chain registry file (array of records with "chainId", "name", "rpc").
# Relative paths resolve against this file's directory.
chains_file = "chains.json"

# Chain ids to activate. The first RPC URL of each chain is used.
chains = [5]

# Log every outbound RPC request and inbound response.
rpc_tracing = false

# Log filter when RUST_LOG is unset.
log_level = "info"

# ── Signing key ─────────────────────────────────────────────────────
# Values support environment variable references: "$VAR" or "${VAR}"

[signer]
private_key = "$FAUCET_PRIVATE_KEY"
# mnemonic = "$FAUCET_MNEMONIC"
# passphrase = ""
# derivation_path = "m/44'/60'/0'/0/0"

# ── Initial nonce bootstrap ─────────────────────────────────────────
# Failed queries are retried until they succeed unless max_attempts is set,
# in which case startup aborts once a chain exhausts it.

[bootstrap]
retry_interval_ms = 1000
# max_attempts = 30
"#,
    )
}
