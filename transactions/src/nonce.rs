//! Per-account nonce bookkeeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Strictly increasing nonce source shared by every step of one pipeline.
///
/// Seeded from the account's pending transaction count when the pipeline is
/// built and re-seeded at the start of every run. A nonce is only consumed
/// when a step actually broadcasts, so steps that skip leave no gaps.
#[derive(Debug, Clone)]
pub struct NonceCounter {
    next: Arc<AtomicU64>,
}

impl NonceCounter {
    pub fn new(start: u64) -> Self {
        Self {
            next: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn reseed(&self, start: u64) {
        self.next.store(start, Ordering::SeqCst);
    }

    /// Take the next nonce.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The nonce the next broadcast will use.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_out_consecutive_nonces() {
        let nonces = NonceCounter::new(7);
        let shared = nonces.clone();
        assert_eq!(nonces.next(), 7);
        assert_eq!(shared.next(), 8);
        assert_eq!(nonces.peek(), 9);
        nonces.reseed(3);
        assert_eq!(shared.next(), 3);
    }
}
