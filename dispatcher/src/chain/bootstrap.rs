//! Per-chain bootstrap: seed the nonce counter from the live transaction count.
//!
//! Each chain moves through `Pending -> Querying -> Succeeded`, looping on
//! `Querying` for as long as the endpoint fails. Under the default
//! [`RetryPolicy`] there is no failed state: an unreachable chain keeps the
//! whole startup waiting rather than being dropped from the registry.

use std::num::NonZeroU32;
use std::time::Duration;

use alloy_primitives::Address;

use super::descriptor::ChainDescriptor;
use super::nonce::NonceCounter;
use super::provider::TransactionCount;
use super::registry::ChainEntry;
use crate::error::Error;

/// Delay and optional cap applied between failed transaction-count queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    interval: Duration,
    max_attempts: Option<NonZeroU32>,
}

impl RetryPolicy {
    /// Retry forever, pausing `interval` between attempts.
    #[must_use]
    pub const fn forever(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Give up after `max_attempts` failed attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: NonZeroU32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay between two attempts.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Attempt cap, `None` when retrying forever.
    #[must_use]
    pub const fn max_attempts(&self) -> Option<NonZeroU32> {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::forever(Duration::from_secs(1))
    }
}

/// Query the initial nonce of `address` on `chain` and build its [`ChainEntry`].
///
/// Network and RPC failures are logged and retried according to `policy`. A
/// transaction count above [`NonceCounter::MAX_SEED`] is treated as a bogus
/// RPC answer and retried the same way.
///
/// # Errors
///
/// Returns [`Error::Bootstrap`] when `policy` carries an attempt cap and
/// every attempt failed, or the first non-transient error returned by `rpc`.
pub async fn bootstrap_chain<R: TransactionCount>(
    chain: ChainDescriptor,
    rpc: R,
    address: Address,
    policy: RetryPolicy,
) -> Result<ChainEntry<R>, Error> {
    tracing::info!(
        chain_id = chain.chain_id,
        %address,
        "Fetching initial nonce for chain {}",
        chain.name
    );

    let mut attempt: u32 = 0;
    let seed = loop {
        attempt = attempt.saturating_add(1);
        let error = match rpc.transaction_count(address).await {
            Ok(count) if count <= NonceCounter::MAX_SEED => break count,
            Ok(count) => Error::Rpc(format!("implausible transaction count {count}")),
            Err(error) if error.is_transient() => error,
            Err(error) => return Err(error),
        };
        tracing::warn!(
            chain_id = chain.chain_id,
            attempt,
            %error,
            "Failed to fetch initial nonce for chain {}",
            chain.name
        );
        if policy
            .max_attempts
            .is_some_and(|max| attempt >= max.get())
        {
            return Err(Error::Bootstrap {
                chain_id: chain.chain_id,
                name: chain.name,
                attempts: attempt,
            });
        }
        if !policy.interval.is_zero() {
            tokio::time::sleep(policy.interval).await;
        }
    };

    tracing::info!(
        chain_id = chain.chain_id,
        nonce = seed,
        %address,
        "Got initial nonce for chain {}",
        chain.name
    );

    Ok(ChainEntry::new(chain, rpc, NonceCounter::new(seed)))
}
