//! Uniswap-V2 reserve arithmetic.
//!
//! Converting LP tokens to underlying truncates; converting underlying back
//! to LP tokens rounds half-up.

use alloy_primitives::{Address, U256};

use stake_utils::numeric::RATIO_PRECISION;
use stake_utils::{scale_by_ratio, FixedDecimal, NumericError};

/// Slippage tolerated on add/remove liquidity, in basis points (3%).
pub const SLIPPAGE_BPS: u64 = 300;

/// Router deadlines are this far past the moment a step runs (12 hours).
pub const DEADLINE_OFFSET_SECS: u64 = 60 * 60 * 12;

const BPS_SCALE: u32 = 4;
const BPS_DENOMINATOR: u64 = 10_000;

/// One snapshot of a pair contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairReserves {
    pub token0: Address,
    pub token1: Address,
    pub reserve0: U256,
    pub reserve1: U256,
    pub total_supply: U256,
}

impl PairReserves {
    pub fn reserve_of(&self, token: Address) -> Option<U256> {
        if token == self.token0 {
            Some(self.reserve0)
        } else if token == self.token1 {
            Some(self.reserve1)
        } else {
            None
        }
    }
}

/// Underlying amount backing `lp_amount`: `reserve * lp_amount / total_supply`, truncated.
pub fn lp_to_underlying(
    lp_amount: U256,
    reserve: U256,
    total_supply: U256,
) -> Result<U256, NumericError> {
    if total_supply.is_zero() {
        return Err(NumericError::DivisionByZero);
    }
    let product = reserve
        .checked_mul(lp_amount)
        .ok_or(NumericError::Overflow)?;
    Ok(product / total_supply)
}

/// LP tokens whose share of `reserve` equals `target`:
/// `round(div(target, reserve, 18) * total_supply)`.
pub fn expected_liquidity(
    target: U256,
    reserve: U256,
    total_supply: U256,
) -> Result<U256, NumericError> {
    let share = FixedDecimal::div(
        &FixedDecimal::from_integer(target),
        &FixedDecimal::from_integer(reserve),
        RATIO_PRECISION,
    )?;
    share
        .mul(&FixedDecimal::from_integer(total_supply))?
        .round_half_up()
}

/// Amount of the other asset matching `amount` of the requested one at the
/// current reserve ratio.
pub fn pair_amount(
    amount: U256,
    request_reserve: U256,
    other_reserve: U256,
) -> Result<U256, NumericError> {
    scale_by_ratio(amount, other_reserve, request_reserve, RATIO_PRECISION)
}

/// Smallest acceptable amount after slippage: `round(amount * (1 - 0.03))`.
pub fn slippage_min(amount: U256) -> Result<U256, NumericError> {
    let factor = FixedDecimal::new(U256::from(BPS_DENOMINATOR - SLIPPAGE_BPS), BPS_SCALE)?;
    FixedDecimal::from_integer(amount)
        .mul(&factor)?
        .round_half_up()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    #[test]
    fn pair_amount_follows_reserves() {
        assert_eq!(pair_amount(u(100), u(1000), u(2000)).unwrap(), u(200));
        assert_eq!(pair_amount(u(100), u(1000), u(1000)).unwrap(), u(100));
        // 100 * 0.333333333333333333 = 33.33.. -> 33
        assert_eq!(pair_amount(u(100), u(3000), u(1000)).unwrap(), u(33));
        // 5 * 0.1 = 0.5 -> 1
        assert_eq!(pair_amount(u(5), u(10), u(1)).unwrap(), u(1));
    }

    #[test]
    fn lp_conversion_truncates() {
        assert_eq!(lp_to_underlying(u(10), u(1000), u(3)).unwrap(), u(3333));
        assert_eq!(lp_to_underlying(u(0), u(1000), u(3)).unwrap(), u(0));
        assert_eq!(
            lp_to_underlying(u(1), u(1), u(0)),
            Err(NumericError::DivisionByZero)
        );
    }

    #[test]
    fn expected_liquidity_rounds_up_at_half() {
        // 150 / 1000 * 10 = 1.5 -> 2
        assert_eq!(expected_liquidity(u(150), u(1000), u(10)).unwrap(), u(2));
        // 140 / 1000 * 10 = 1.4 -> 1
        assert_eq!(expected_liquidity(u(140), u(1000), u(10)).unwrap(), u(1));
        assert_eq!(expected_liquidity(u(100), u(1000), u(500)).unwrap(), u(50));
    }

    #[test]
    fn conversions_invert_each_other() {
        let supply = u(1_000_000);
        let reserve = u(4_000_000);
        let lp = u(12_345);
        let underlying = lp_to_underlying(lp, reserve, supply).unwrap();
        assert_eq!(underlying, u(49_380));
        assert_eq!(expected_liquidity(underlying, reserve, supply).unwrap(), lp);
    }

    #[test]
    fn slippage_min_is_ninety_seven_percent() {
        assert_eq!(slippage_min(u(100)).unwrap(), u(97));
        // 15 * 0.97 = 14.55 -> 15
        assert_eq!(slippage_min(u(15)).unwrap(), u(15));
        // 10 * 0.97 = 9.7 -> 10
        assert_eq!(slippage_min(u(10)).unwrap(), u(10));
        assert_eq!(slippage_min(u(1000)).unwrap(), u(970));
        assert_eq!(slippage_min(U256::ZERO).unwrap(), U256::ZERO);
    }

    #[test]
    fn reserves_are_keyed_by_token() {
        let pair = PairReserves {
            token0: Address::repeat_byte(1),
            token1: Address::repeat_byte(2),
            reserve0: u(10),
            reserve1: u(20),
            total_supply: u(5),
        };
        assert_eq!(pair.reserve_of(Address::repeat_byte(2)), Some(u(20)));
        assert_eq!(pair.reserve_of(Address::repeat_byte(3)), None);
    }
}
