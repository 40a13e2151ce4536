//! Transaction pipelines.
//!
//! A pipeline is an ordered list of named steps built at quote time and run
//! later, strictly one after another, against a live signer. Each step sees
//! the context accumulated from the patches returned by earlier steps. There
//! is no rollback: the first failing step aborts the run and everything
//! already broadcast stays on chain.

pub mod builder;
pub mod error;
pub mod nonce;
pub mod pipeline;
pub mod signer;

pub use builder::{Merge, TxBuilder};
pub use error::TxError;
pub use nonce::NonceCounter;
pub use pipeline::Pipeline;
pub use signer::SignerContext;
