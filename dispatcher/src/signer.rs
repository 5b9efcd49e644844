//! Signing address resolution from the `[signer]` config section.
//!
//! The faucet sends from one address on every chain. It is derived from
//!
//! 1. `private_key` — hex, 0x-prefixed or not (highest priority), or
//! 2. `mnemonic` — BIP-39 phrase, BIP-44 derived via the [`kobe`] crates.
//!
//! Every value may reference an environment variable as `$VAR` or `${VAR}`.

use std::fmt;

use alloy_primitives::Address;
use alloy_signer_local::PrivateKeySigner;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default EVM BIP-44 derivation path (`MetaMask` / Trezor compatible).
const DEFAULT_EVM_PATH: &str = "m/44'/60'/0'/0/0";

/// `[signer]` section of the configuration file.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Hex private key or environment reference.
    #[serde(default)]
    pub private_key: Option<String>,
    /// BIP-39 mnemonic or environment reference.
    #[serde(default)]
    pub mnemonic: Option<String>,
    /// Optional BIP-39 passphrase.
    #[serde(default)]
    pub passphrase: Option<String>,
    /// BIP-44 path, defaults to `m/44'/60'/0'/0/0`.
    #[serde(default)]
    pub derivation_path: Option<String>,
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .field("derivation_path", &self.derivation_path)
            .finish_non_exhaustive()
    }
}

impl SignerConfig {
    /// Resolve the configured key material into a signer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signer`] if no key is configured, an environment
    /// reference is unset, or the key cannot be parsed or derived.
    pub fn signer(&self) -> Result<PrivateKeySigner, Error> {
        let key = if let Some(raw) = &self.private_key {
            resolve_env(raw)?
        } else if let Some(raw) = &self.mnemonic {
            let mnemonic = resolve_env(raw)?;
            let passphrase = self.passphrase.as_deref().map(resolve_env).transpose()?;
            derive_evm_key(
                &mnemonic,
                passphrase.as_deref(),
                self.derivation_path.as_deref(),
            )?
        } else {
            return Err(Error::signer(
                "neither `private_key` nor `mnemonic` is set in [signer]",
            ));
        };

        key.trim()
            .parse()
            .map_err(|e| Error::Signer(format!("invalid private key: {e}")))
    }

    /// Address the faucet sends from.
    ///
    /// # Errors
    ///
    /// See [`SignerConfig::signer`].
    pub fn address(&self) -> Result<Address, Error> {
        self.signer().map(|signer| signer.address())
    }
}

/// Resolve an environment-variable reference (`$VAR` or `${VAR}`), returning
/// the literal string unchanged if it does not match either pattern.
fn resolve_env(value: &str) -> Result<String, Error> {
    let name = value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .or_else(|| {
            value
                .strip_prefix('$')
                .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_alphanumeric() || c == '_'))
        });

    match name {
        Some(var) => std::env::var(var).map_err(|_| {
            Error::Signer(format!("env var '{var}' not found (referenced as '{value}')"))
        }),
        None => Ok(value.to_owned()),
    }
}

/// Derive an EVM private key (0x-prefixed hex) from a mnemonic phrase.
fn derive_evm_key(
    mnemonic: &str,
    passphrase: Option<&str>,
    path: Option<&str>,
) -> Result<String, Error> {
    let wallet = kobe::Wallet::from_mnemonic(mnemonic, passphrase)
        .map_err(|e| Error::Signer(format!("mnemonic parse error: {e}")))?;
    let deriver = kobe_eth::Deriver::new(&wallet);
    let derived = deriver
        .derive_path(path.unwrap_or(DEFAULT_EVM_PATH))
        .map_err(|e| Error::Signer(format!("EVM key derivation error: {e}")))?;
    Ok(format!("0x{}", &*derived.private_key_hex))
}
