//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the stake engine (clock, RPC endpoints,
//! the chain itself, the wallet) sits behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: build a [`NullChain`], seed it with tokens, pairs and pools, then
//! hand its providers and a [`NullWallet`] to the code under test.

pub mod chain;
pub mod clock;
pub mod provider;
pub mod wallet;

pub use chain::{NullChain, SentTransaction};
pub use clock::NullClock;
pub use provider::{FailingProvider, NullProvider, SlowProvider};
pub use wallet::{NullSigner, NullWallet};
