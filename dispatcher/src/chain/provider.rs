//! RPC handle construction for a chain endpoint.

use std::fmt;
use std::future::Future;

use alloy_primitives::Address;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_client::ClientBuilder;
use url::Url;

use super::descriptor::ChainDescriptor;
use super::trace::RpcTraceLayer;
use crate::error::Error;

/// The single RPC operation the bootstrap phase depends on.
pub trait TransactionCount: Send + Sync {
    /// Number of transactions sent from `address`, i.e. its next nonce.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the endpoint cannot be reached and
    /// [`Error::Rpc`] if it answers with an error or an unusable response.
    fn transaction_count(&self, address: Address) -> impl Future<Output = Result<u64, Error>> + Send;
}

/// Request/response handle to one chain's RPC endpoint.
///
/// Cheap to clone and safe to share across tasks.
#[derive(Clone)]
pub struct RpcHandle {
    provider: DynProvider,
    endpoint: Url,
    traced: bool,
}

impl RpcHandle {
    /// Underlying provider for RPC calls beyond nonce seeding.
    #[must_use]
    pub const fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Endpoint this handle talks to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether requests and responses are logged.
    #[must_use]
    pub const fn is_traced(&self) -> bool {
        self.traced
    }
}

impl fmt::Debug for RpcHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcHandle")
            .field("endpoint", &self.endpoint.as_str())
            .field("traced", &self.traced)
            .finish_non_exhaustive()
    }
}

impl TransactionCount for RpcHandle {
    async fn transaction_count(&self, address: Address) -> Result<u64, Error> {
        Ok(self.provider.get_transaction_count(address).await?)
    }
}

/// Build an [`RpcHandle`] for `endpoint`.
///
/// With `tracing_enabled`, the HTTP transport is wrapped in an
/// [`RpcTraceLayer`]. The handle performs no retries.
///
/// # Errors
///
/// Returns [`Error::Config`] if `endpoint` is not a valid URL.
pub fn build_rpc_handle(
    chain_id: u64,
    endpoint: &str,
    tracing_enabled: bool,
) -> Result<RpcHandle, Error> {
    let url: Url = endpoint
        .parse()
        .map_err(|e| Error::config_with(format!("invalid RPC URL '{endpoint}' for chain {chain_id}"), e))?;

    let provider = if tracing_enabled {
        let client = ClientBuilder::default()
            .layer(RpcTraceLayer::new(chain_id))
            .http(url.clone());
        ProviderBuilder::new().connect_client(client).erased()
    } else {
        ProviderBuilder::new().connect_http(url.clone()).erased()
    };

    Ok(RpcHandle {
        provider,
        endpoint: url,
        traced: tracing_enabled,
    })
}

/// Build the [`RpcHandle`] for a chain using its first candidate endpoint.
///
/// Remaining candidates are never tried.
///
/// # Errors
///
/// Returns [`Error::Config`] if the chain lists no endpoint or the first one
/// is not a valid URL.
pub fn connect(chain: &ChainDescriptor, tracing_enabled: bool) -> Result<RpcHandle, Error> {
    let endpoint = chain.primary_rpc().ok_or_else(|| {
        Error::config(format!(
            "no RPC endpoint listed for chain {} ({})",
            chain.chain_id, chain.name
        ))
    })?;
    build_rpc_handle(chain.chain_id, endpoint, tracing_enabled)
}
