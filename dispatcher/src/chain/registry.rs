//! Runtime chain registry: one RPC handle and one nonce counter per active chain.

use std::collections::hash_map::{self, HashMap};
use std::collections::HashSet;
use std::sync::Arc;

use alloy_primitives::Address;
use futures_util::future::try_join_all;
use tokio::sync::OnceCell;

use super::bootstrap::{RetryPolicy, bootstrap_chain};
use super::descriptor::ChainDescriptor;
use super::nonce::NonceCounter;
use super::provider::{self, RpcHandle, TransactionCount};
use crate::error::Error;

/// Everything needed to dispatch a transaction on one chain.
#[derive(Debug)]
pub struct ChainEntry<R = RpcHandle> {
    chain: ChainDescriptor,
    rpc: R,
    nonce: NonceCounter,
}

impl<R> ChainEntry<R> {
    pub(crate) const fn new(chain: ChainDescriptor, rpc: R, nonce: NonceCounter) -> Self {
        Self { chain, rpc, nonce }
    }

    /// Static metadata of the chain.
    #[must_use]
    pub const fn chain(&self) -> &ChainDescriptor {
        &self.chain
    }

    /// RPC handle of the chain.
    #[must_use]
    pub const fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Nonce counter of the signing address on this chain.
    #[must_use]
    pub const fn nonce(&self) -> &NonceCounter {
        &self.nonce
    }
}

/// Fully bootstrapped mapping from chain id to [`ChainEntry`].
///
/// Immutable once assembled; only the counters inside the entries advance.
#[derive(Debug)]
pub struct ChainRegistry<R = RpcHandle> {
    entries: HashMap<u64, ChainEntry<R>>,
}

impl<R> ChainRegistry<R> {
    /// Entry for `chain_id`, if that chain is active.
    #[must_use]
    pub fn lookup(&self, chain_id: u64) -> Option<&ChainEntry<R>> {
        self.entries.get(&chain_id)
    }

    /// Take the next nonce on `chain_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the chain is not active.
    pub fn take_nonce(&self, chain_id: u64) -> Result<u64, Error> {
        self.lookup(chain_id)
            .map(|entry| entry.nonce.take())
            .ok_or(Error::NotFound(chain_id))
    }

    /// Iterates over all active chains in no particular order.
    pub fn iter(&self) -> hash_map::Values<'_, u64, ChainEntry<R>> {
        self.entries.values()
    }

    /// Number of active chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no chain is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a, R> IntoIterator for &'a ChainRegistry<R> {
    type Item = &'a ChainEntry<R>;
    type IntoIter = hash_map::Values<'a, u64, ChainEntry<R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<R: TransactionCount> ChainRegistry<R> {
    /// Bootstrap every chain concurrently and assemble the registry.
    ///
    /// `connect` builds the RPC handle of a chain and is invoked exactly once
    /// per distinct chain id; repeated ids keep their first descriptor. The
    /// registry is returned only after every chain has been seeded.
    ///
    /// # Errors
    ///
    /// Returns the first error from `connect`, or [`Error::Bootstrap`] if
    /// `policy` caps attempts and a chain exhausted them.
    pub async fn bootstrap_with<F>(
        chains: Vec<ChainDescriptor>,
        address: Address,
        policy: RetryPolicy,
        connect: F,
    ) -> Result<Self, Error>
    where
        F: Fn(&ChainDescriptor) -> Result<R, Error>,
    {
        let mut seen = HashSet::with_capacity(chains.len());
        let mut pending = Vec::with_capacity(chains.len());
        for chain in chains {
            if !seen.insert(chain.chain_id) {
                tracing::warn!(
                    chain_id = chain.chain_id,
                    "Ignoring duplicate registry record for chain {}",
                    chain.name
                );
                continue;
            }
            let rpc = connect(&chain)?;
            pending.push(bootstrap_chain(chain, rpc, address, policy));
        }

        let entries = try_join_all(pending)
            .await?
            .into_iter()
            .map(|entry| (entry.chain.chain_id, entry))
            .collect();
        Ok(Self { entries })
    }
}

impl ChainRegistry<RpcHandle> {
    /// Bootstrap `chains` against their first RPC endpoint.
    ///
    /// # Errors
    ///
    /// See [`ChainRegistry::bootstrap_with`].
    pub async fn bootstrap(
        chains: Vec<ChainDescriptor>,
        address: Address,
        policy: RetryPolicy,
        rpc_tracing: bool,
    ) -> Result<Self, Error> {
        Self::bootstrap_with(chains, address, policy, |chain| {
            provider::connect(chain, rpc_tracing)
        })
        .await
    }
}

/// Publish-once slot through which the serving layer reaches the registry.
///
/// Readers see nothing until the complete registry is stored; assembly runs
/// at most once no matter how many callers race on [`bootstrap_with`](Self::bootstrap_with).
#[derive(Debug)]
pub struct RegistryCell<R = RpcHandle> {
    inner: Arc<OnceCell<ChainRegistry<R>>>,
}

impl<R> Clone for RegistryCell<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> Default for RegistryCell<R> {
    fn default() -> Self {
        Self {
            inner: Arc::new(OnceCell::new()),
        }
    }
}

impl<R> RegistryCell<R> {
    /// Creates an empty cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry, once every chain has been bootstrapped.
    #[must_use]
    pub fn get(&self) -> Option<&ChainRegistry<R>> {
        self.inner.get()
    }

    /// Whether the registry has been published.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.initialized()
    }
}

impl<R: TransactionCount> RegistryCell<R> {
    /// Assemble and publish the registry, or return the one already published.
    ///
    /// # Errors
    ///
    /// See [`ChainRegistry::bootstrap_with`]. On error the cell stays empty.
    pub async fn bootstrap_with<F>(
        &self,
        chains: Vec<ChainDescriptor>,
        address: Address,
        policy: RetryPolicy,
        connect: F,
    ) -> Result<&ChainRegistry<R>, Error>
    where
        F: Fn(&ChainDescriptor) -> Result<R, Error>,
    {
        self.inner
            .get_or_try_init(|| ChainRegistry::bootstrap_with(chains, address, policy, connect))
            .await
    }
}

impl RegistryCell<RpcHandle> {
    /// Assemble and publish the registry against each chain's first endpoint.
    ///
    /// # Errors
    ///
    /// See [`ChainRegistry::bootstrap_with`].
    pub async fn bootstrap(
        &self,
        chains: Vec<ChainDescriptor>,
        address: Address,
        policy: RetryPolicy,
        rpc_tracing: bool,
    ) -> Result<&ChainRegistry, Error> {
        self.bootstrap_with(chains, address, policy, |chain| {
            provider::connect(chain, rpc_tracing)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::chain::bootstrap::tests::FlakyRpc;

    fn chain(id: u64) -> ChainDescriptor {
        ChainDescriptor::new(id, format!("chain-{id}"), vec![format!("https://{id}.example")])
    }

    fn immediate() -> RetryPolicy {
        RetryPolicy::forever(Duration::ZERO)
    }

    #[tokio::test]
    async fn assembles_one_entry_per_chain() {
        let registry = ChainRegistry::bootstrap_with(
            vec![chain(1), chain(5), chain(137)],
            Address::ZERO,
            immediate(),
            |c| Ok(FlakyRpc::failing(1, c.chain_id * 10)),
        )
        .await
        .expect("bootstrap succeeds");

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.take_nonce(5).expect("active"), 50);
        assert_eq!(registry.take_nonce(5).expect("active"), 51);
        assert_eq!(registry.lookup(137).expect("active").nonce().peek(), 1370);
        assert_eq!(registry.lookup(1).expect("active").nonce().peek(), 10);
        assert!(matches!(registry.take_nonce(999), Err(Error::NotFound(999))));
    }

    #[tokio::test]
    async fn duplicate_ids_are_connected_once() {
        let connects = Mutex::new(Vec::new());
        let registry = ChainRegistry::bootstrap_with(
            vec![chain(5), chain(5), chain(100)],
            Address::ZERO,
            immediate(),
            |c| {
                connects.lock().expect("not poisoned").push(c.chain_id);
                Ok(FlakyRpc::failing(0, 0))
            },
        )
        .await
        .expect("bootstrap succeeds");

        assert_eq!(registry.len(), 2);
        assert_eq!(*connects.lock().expect("not poisoned"), vec![5, 100]);
    }

    #[tokio::test]
    async fn connect_failure_aborts_assembly() {
        let result = ChainRegistry::bootstrap_with(
            vec![chain(1), chain(2)],
            Address::ZERO,
            immediate(),
            |c| {
                if c.chain_id == 2 {
                    Err(Error::config("no RPC endpoint"))
                } else {
                    Ok(FlakyRpc::failing(0, 0))
                }
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn registry_is_published_all_or_nothing() {
        let cell: RegistryCell<FlakyRpc> = RegistryCell::new();
        let policy = RetryPolicy::forever(Duration::from_secs(1));

        let publisher = tokio::spawn({
            let cell = cell.clone();
            async move {
                cell.bootstrap_with(vec![chain(1), chain(2), chain(3)], Address::ZERO, policy, |c| {
                    // Chain 3 needs five retries, the others answer at once.
                    let failures = if c.chain_id == 3 { 5 } else { 0 };
                    Ok(FlakyRpc::failing(failures, c.chain_id))
                })
                .await
                .map(ChainRegistry::len)
            }
        });

        for _ in 0..4 {
            tokio::time::sleep(Duration::from_secs(1)).await;
            assert!(!cell.is_ready());
            assert!(cell.get().is_none());
        }

        let published = publisher.await.expect("publisher panicked").expect("bootstrap succeeds");
        assert_eq!(published, 3);
        let registry = cell.get().expect("published");
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.lookup(3).expect("active").rpc().calls(), 6);
    }

    #[tokio::test]
    async fn cell_bootstraps_only_once() {
        let cell: RegistryCell<FlakyRpc> = RegistryCell::new();
        let connects = AtomicU32::new(0);
        let connect = |_: &ChainDescriptor| {
            connects.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Error>(FlakyRpc::failing(0, 3))
        };

        let (a, b) = tokio::join!(
            cell.bootstrap_with(vec![chain(1)], Address::ZERO, immediate(), connect),
            cell.bootstrap_with(vec![chain(1)], Address::ZERO, immediate(), connect),
        );
        a.expect("bootstrap succeeds");
        b.expect("bootstrap succeeds");

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        let registry = cell.get().expect("published");
        assert_eq!(registry.take_nonce(1).expect("active"), 3);
        assert_eq!(registry.take_nonce(1).expect("active"), 4);
    }

    #[tokio::test]
    async fn failed_bootstrap_leaves_cell_empty() {
        let cell: RegistryCell<FlakyRpc> = RegistryCell::new();
        let policy = immediate().with_max_attempts(std::num::NonZeroU32::MIN);
        let result = cell
            .bootstrap_with(vec![chain(1)], Address::ZERO, policy, |_| Ok(FlakyRpc::dead()))
            .await;

        assert!(matches!(result, Err(Error::Bootstrap { chain_id: 1, .. })));
        assert!(cell.get().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_takes_across_chains_stay_exact() {
        let registry = Arc::new(
            ChainRegistry::bootstrap_with(vec![chain(1), chain(2)], Address::ZERO, immediate(), |c| {
                Ok(FlakyRpc::failing(0, c.chain_id * 1_000))
            })
            .await
            .expect("bootstrap succeeds"),
        );

        let workers: Vec<_> = (0..32)
            .map(|i| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    let chain_id = if i % 2 == 0 { 1 } else { 2 };
                    (0..50)
                        .map(|_| (chain_id, registry.take_nonce(chain_id).expect("active")))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut per_chain: HashMap<u64, Vec<u64>> = HashMap::new();
        for worker in workers {
            for (chain_id, nonce) in worker.await.expect("worker panicked") {
                per_chain.entry(chain_id).or_default().push(nonce);
            }
        }

        for (chain_id, mut nonces) in per_chain {
            nonces.sort_unstable();
            let seed = chain_id * 1_000;
            assert_eq!(nonces, (seed..seed + 800).collect::<Vec<_>>());
        }
    }
}
