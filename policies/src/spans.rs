//! Pre-built [`tracing::Span`] constructors for policy operations.

use tracing::{info_span, Span};

/// Span covering one `fetch_change_quote` call.
pub fn quote_span(stake_policy_id: &str, action: &str) -> Span {
    info_span!("quote", policy = %stake_policy_id, action = %action)
}

/// Span covering one `fetch_stake_position` call.
pub fn position_span(stake_policy_id: &str) -> Span {
    info_span!("position", policy = %stake_policy_id)
}

/// Span covering one run of an approved quote's pipeline.
pub fn approve_span(stake_policy_id: &str) -> Span {
    info_span!("approve", policy = %stake_policy_id)
}
