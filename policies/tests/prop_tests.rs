use proptest::prelude::*;

use alloy_primitives::U256;
use stake_policies::lp_math::{expected_liquidity, lp_to_underlying, pair_amount, slippage_min};

proptest! {
    /// Unwinding LP tokens and asking for the same underlying back loses at
    /// most one LP unit, as long as the pool holds at least as much of the
    /// asset as there are LP tokens.
    #[test]
    fn lp_round_trip_loses_at_most_one_unit(
        supply in 1u64..500_000_000_000_000_000,
        factor in 1u64..1_000,
        lp_share in 0u64..=1_000,
    ) {
        let supply = U256::from(supply);
        let reserve = supply * U256::from(factor);
        let lp = supply * U256::from(lp_share) / U256::from(1_000u64);

        let underlying = lp_to_underlying(lp, reserve, supply).unwrap();
        let back = expected_liquidity(underlying, reserve, supply).unwrap();
        prop_assert!(back <= lp);
        prop_assert!(lp - back <= U256::from(1u8));
    }

    /// Equal reserves pair one-for-one.
    #[test]
    fn pair_amount_with_equal_reserves_is_identity(
        amount in any::<u64>(),
        reserve in 1u64..u64::MAX,
    ) {
        let r = U256::from(reserve);
        prop_assert_eq!(pair_amount(U256::from(amount), r, r).unwrap(), U256::from(amount));
    }

    /// Whole-number reserve ratios scale exactly.
    #[test]
    fn pair_amount_scales_by_whole_ratio(
        amount in any::<u64>(),
        reserve in 1u64..1_000_000_000,
        k in 1u64..1_000,
    ) {
        let r = U256::from(reserve);
        let scaled = pair_amount(U256::from(amount), r, r * U256::from(k)).unwrap();
        prop_assert_eq!(scaled, U256::from(amount) * U256::from(k));
    }

    /// The slippage floor stays within [97%, 100%] of the amount.
    #[test]
    fn slippage_min_is_bounded(amount in any::<u64>()) {
        let amount = U256::from(amount);
        let min = slippage_min(amount).unwrap();
        prop_assert!(min <= amount);
        prop_assert!(min * U256::from(100u8) + U256::from(100u8) >= amount * U256::from(97u8));
    }
}
