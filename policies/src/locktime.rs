//! Epoch-based lockups (masonry style).

use alloy_primitives::U256;

use stake_types::Timestamp;

/// The on-chain epoch state needed to place an unlock instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochSchedule {
    pub current_epoch: U256,
    /// Start of the next epoch.
    pub next_epoch_point: Timestamp,
    /// Epoch length in seconds.
    pub period_secs: u64,
    /// Epoch at which the account's lockup timer was last reset.
    pub timer_start: U256,
}

/// When a lockup of `lockup_epochs` (counted from the account's timer
/// start) elapses, or `None` if it already has.
///
/// With exactly one epoch remaining this is the next epoch point; each
/// further epoch adds one period.
pub fn epoch_unlock_time(schedule: &EpochSchedule, lockup_epochs: U256) -> Option<Timestamp> {
    let target = schedule.timer_start.saturating_add(lockup_epochs);
    if target <= schedule.current_epoch {
        return None;
    }
    let extra_epochs: u64 = (target - schedule.current_epoch - U256::from(1u8)).saturating_to();
    Some(
        schedule
            .next_epoch_point
            .plus_secs(extra_epochs.saturating_mul(schedule.period_secs)),
    )
}
