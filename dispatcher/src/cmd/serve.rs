//! `faucet-dispatcher serve` — bootstrap the chain registry and hold it.
//!
//! Loads the configuration, derives the signing address, selects the
//! configured chains from the chain registry file, seeds one nonce counter
//! per chain, publishes the registry, and keeps it alive until a shutdown
//! signal arrives.

use std::path::Path;

use dotenvy::dotenv;

use crate::chain::{RegistryCell, filter, load_descriptors, unmatched};
use crate::config::load_config;
use crate::error::Error;
use crate::signal::Shutdown;
use crate::telemetry::Telemetry;

/// Execute the `serve` command.
///
/// # Errors
///
/// Returns an error if configuration, signer or chain selection is invalid,
/// if a capped bootstrap gives up, or if signal registration fails.
pub async fn run(config_path: &Path) -> Result<(), Error> {
    dotenv().ok();

    let config = load_config(config_path)?;
    let _telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_log_level(config.log_level.clone())
        .register();

    let address = config
        .signer
        .address()
        .inspect_err(|e| tracing::error!(error = %e, "cannot derive signing address"))?;
    let wanted = config.selected_chains()?;

    let known = load_descriptors(&config.chains_file)?;
    for chain_id in unmatched(&known, wanted) {
        tracing::warn!(
            chain_id,
            file = %config.chains_file.display(),
            "configured chain is not in the chain registry and stays inactive"
        );
    }
    let selected = filter(&known, wanted);
    if selected.is_empty() {
        return Err(Error::config(
            "none of the configured chains is listed in the chain registry",
        ));
    }

    let shutdown = Shutdown::listen()?;
    let cancelled = shutdown.token();
    let cell: RegistryCell = RegistryCell::new();

    tracing::info!(%address, chains = selected.len(), "bootstrapping chains");
    let registry = tokio::select! {
        result = cell.bootstrap(
            selected,
            address,
            config.bootstrap.retry_policy(),
            config.rpc_tracing,
        ) => result.inspect_err(|e| tracing::error!(error = %e, "bootstrap aborted"))?,
        () = cancelled.cancelled() => {
            tracing::info!("shutdown requested before every chain was bootstrapped");
            return Ok(());
        }
    };

    for entry in registry {
        tracing::info!(
            chain_id = entry.chain().chain_id,
            endpoint = %entry.rpc().endpoint(),
            next_nonce = entry.nonce().peek(),
            "chain {} ready",
            entry.chain().name
        );
    }
    tracing::info!(chains = registry.len(), "chain registry published");

    shutdown.wait().await;
    Ok(())
}
