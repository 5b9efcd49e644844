//! Chain selection, RPC handles, nonce counters, and registry bootstrap.
//!
//! - [`descriptor`] — [`ChainDescriptor`], registry-file parsing, and [`filter`].
//! - [`provider`] — [`RpcHandle`] factory with optional request tracing.
//! - [`nonce`] — [`NonceCounter`], the per-chain atomic nonce source.
//! - [`bootstrap`] — seeding a chain's counter with retries.
//! - [`registry`] — [`ChainRegistry`] assembly and the publish-once [`RegistryCell`].

pub mod bootstrap;
pub mod descriptor;
pub mod nonce;
pub mod provider;
pub mod registry;
pub mod trace;

pub use self::bootstrap::{RetryPolicy, bootstrap_chain};
pub use self::descriptor::{ChainDescriptor, filter, load_descriptors, unmatched};
pub use self::nonce::NonceCounter;
pub use self::provider::{RpcHandle, TransactionCount, build_rpc_handle, connect};
pub use self::registry::{ChainEntry, ChainRegistry, RegistryCell};
pub use self::trace::RpcTraceLayer;
