//! Fundamental types for the stake engine.
//!
//! This crate defines the data model shared across every other crate in the
//! workspace: asset references, native amounts, actions, quote and position
//! allocations, timestamps, and the public error taxonomy.

pub mod action;
pub mod amount;
pub mod asset;
pub mod error;
pub mod policy;
pub mod position;
pub mod quote;
pub mod time;

pub use action::StakeAction;
pub use amount::NativeAmount;
pub use asset::AssetRef;
pub use error::StakeError;
pub use policy::{StakePolicy, StakeProviderInfo};
pub use position::{PositionAllocation, PositionAllocationType, StakeDetails, StakePosition};
pub use quote::{AllocationType, Approve, ChangeQuote, QuoteAllocation};
pub use time::Timestamp;
