//! Stake policies.
//!
//! A policy binds a stake policy id to the contracts that implement it and
//! knows how to quote an action and read a position. Two strategies exist:
//! the single-asset masonry ([`MasonryPolicy`]) and the two-asset LP reward
//! pool ([`CemeteryPolicy`]). [`fantom`] wires both into the Fantom catalog.

pub mod cemetery;
pub mod fantom;
pub mod locktime;
pub mod lp_math;
pub mod masonry;
pub mod metadata;
pub mod policy;
pub mod registry;
pub mod spans;
pub mod workflow;

pub use cemetery::{CemeteryOptions, CemeteryPolicy};
pub use locktime::{epoch_unlock_time, EpochSchedule};
pub use masonry::{MasonryOptions, MasonryPolicy};
pub use metadata::{MetadataCategory, TxMetadata, TxMetadataCache, TxMetadataEntry};
pub use policy::{
    derive_stake_policy_id, ChangeQuoteRequest, PolicyOptions, StakePluginPolicy, StakePolicyInfo,
    StakePositionRequest,
};
pub use registry::PolicyRegistry;
pub use workflow::PipelineContext;
