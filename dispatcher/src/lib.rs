//! Nonce-synchronized multi-chain transaction dispatch core for faucets.
//!
//! For every active chain the [`ChainRegistry`](chain::ChainRegistry) holds
//! one RPC handle and one [`NonceCounter`](chain::NonceCounter) seeded from
//! the signing address's on-chain transaction count. Concurrent callers of
//! [`NonceCounter::take`](chain::NonceCounter::take) never receive the same
//! nonce twice and never skip one.
//!
//! ```ignore
//! let registry = ChainRegistry::bootstrap(chains, address, RetryPolicy::default(), false).await?;
//! let entry = registry.lookup(5).ok_or(Error::NotFound(5))?;
//! let nonce = entry.nonce().take();
//! ```

pub mod chain;
pub mod cmd;
pub mod config;
pub mod error;
pub mod signal;
pub mod signer;
pub mod telemetry;

pub use error::Error;
