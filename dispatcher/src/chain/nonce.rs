//! Per-chain transaction nonce counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing nonce source for one chain and one signing address.
///
/// Seeded once at bootstrap from the on-chain transaction count. The only
/// mutation is [`take`](Self::take), which hands out each value exactly once.
/// A nonce whose transaction never reaches the chain stays consumed; filling
/// such a gap is up to the caller.
#[derive(Debug)]
pub struct NonceCounter {
    next: AtomicU64,
}

impl NonceCounter {
    /// Largest seed accepted at bootstrap.
    ///
    /// Leaves 2^63 values of headroom, so [`take`](Self::take) cannot wrap
    /// within any realistic process lifetime.
    pub const MAX_SEED: u64 = u64::MAX >> 1;

    /// Creates a counter whose first [`take`](Self::take) returns `seed`.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    /// Returns the next nonce and advances the counter in one atomic step.
    pub fn take(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The value the next [`take`](Self::take) will return.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}
