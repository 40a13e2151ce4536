use alloy_primitives::U256;
use proptest::prelude::*;

use stake_utils::numeric::RATIO_PRECISION;
use stake_utils::{round, scale_by_ratio, FixedDecimal};

proptest! {
    /// round() rounds up exactly when the leading fractional digit is >= 5.
    #[test]
    fn round_follows_leading_digit(int in any::<u64>(), frac in "[0-9]{1,12}") {
        let text = format!("{int}.{frac}");
        let lead = frac.as_bytes()[0] - b'0';
        let expected = if lead >= 5 { int as u128 + 1 } else { int as u128 };
        prop_assert_eq!(round(&text).unwrap(), expected.to_string());
    }

    /// Scaling by a reserve ratio lands within one unit of the exact quotient.
    #[test]
    fn ratio_scaling_within_one_unit(
        x in 0u64..1_000_000_000_000,
        ra in 1u64..1_000_000_000_000,
        rb in 0u64..1_000_000_000_000,
    ) {
        let b = scale_by_ratio(U256::from(x), U256::from(rb), U256::from(ra), RATIO_PRECISION).unwrap();
        let exact_floor = U256::from(x as u128 * rb as u128 / ra as u128);
        prop_assert!(b >= exact_floor);
        prop_assert!(b <= exact_floor + U256::from(1u8));
    }

    /// Parsing and displaying a decimal preserves its value.
    #[test]
    fn display_parses_back(int in any::<u64>(), frac in "[0-9]{0,18}") {
        let text = if frac.is_empty() { int.to_string() } else { format!("{int}.{frac}") };
        let d = FixedDecimal::parse(&text).unwrap();
        let again = FixedDecimal::parse(&d.to_string()).unwrap();
        prop_assert_eq!(again.to_native(18).unwrap(), d.to_native(18).unwrap());
    }
}
