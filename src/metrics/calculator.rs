//! Pure numeric transforms between on-chain integers and display figures.

use std::str::FromStr;

use alloy::primitives::U256;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::errors::CalculationError;

pub const SECONDS_PER_YEAR: u32 = 31_536_000;
pub const RAY_DECIMALS: u8 = 27;

const MAX_DECIMAL_SCALE: u32 = 28;

/// Compound a per-period rate over `periods_per_year` periods and return the
/// effective annual yield as a percentage: `((1 + rate)^n - 1) * 100`.
pub fn rate_to_apy(periodic_rate: Decimal, periods_per_year: u32) -> Result<Decimal, CalculationError> {
    if periodic_rate.is_zero() || periods_per_year == 0 {
        return Ok(Decimal::ZERO);
    }
    let base = Decimal::ONE
        .checked_add(periodic_rate)
        .ok_or(CalculationError::Overflow { what: "apy base" })?;
    let grown = base
        .checked_powi(i64::from(periods_per_year))
        .ok_or(CalculationError::Overflow { what: "apy" })?;
    (grown - Decimal::ONE)
        .checked_mul(dec!(100))
        .ok_or(CalculationError::Overflow { what: "apy" })
}

/// Percentage of liquidity currently lent out. Zero when there is no liquidity.
/// Not clamped: debt above tracked liquidity yields more than 100.
pub fn utilization(total_debt: Decimal, total_liquidity: Decimal) -> Result<Decimal, CalculationError> {
    if total_liquidity <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    total_debt
        .checked_div(total_liquidity)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .ok_or(CalculationError::Overflow {
            what: "utilization",
        })
}

/// `raw / 10^decimals`, split in U256 before converting so the fractional
/// digits survive intact.
pub fn scale_fixed_point(raw: U256, decimals: u8) -> Result<Decimal, CalculationError> {
    let scale = u32::from(decimals);
    if scale > MAX_DECIMAL_SCALE {
        return Err(CalculationError::ScaleTooLarge(scale));
    }
    let unit = U256::from(10u8).pow(U256::from(scale));
    let whole = raw / unit;
    let fraction = raw % unit;

    let whole = Decimal::from_str(&whole.to_string()).map_err(|_| CalculationError::Overflow {
        what: "fixed-point amount",
    })?;
    // fraction < 10^28 always fits in i128
    let fraction = Decimal::from_i128_with_scale(fraction.to::<u128>() as i128, scale);
    whole
        .checked_add(fraction)
        .map(|d| d.normalize())
        .ok_or(CalculationError::Overflow {
            what: "fixed-point amount",
        })
}

/// Aave stores annual rates in RAY; this returns the per-second rate.
pub fn ray_rate_per_second(ray_rate: U256) -> Result<Decimal, CalculationError> {
    let annual = scale_fixed_point(ray_rate, RAY_DECIMALS)?;
    Ok(annual / Decimal::from(SECONDS_PER_YEAR))
}

/// Supply APY percentage from an Aave RAY liquidity rate.
pub fn ray_rate_to_apy(ray_rate: U256) -> Result<Decimal, CalculationError> {
    rate_to_apy(ray_rate_per_second(ray_rate)?, SECONDS_PER_YEAR)
}

/// Fraction (e.g. `0.0412` from an API) to a percentage.
pub fn fraction_to_percent(value: Decimal) -> Decimal {
    value * dec!(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_is_zero_without_liquidity() {
        assert_eq!(utilization(dec!(500), Decimal::ZERO), Ok(Decimal::ZERO));
        assert_eq!(utilization(dec!(500), dec!(-10)), Ok(Decimal::ZERO));
    }

    #[test]
    fn utilization_is_debt_over_liquidity() {
        assert_eq!(utilization(dec!(96), dec!(100)), Ok(dec!(96)));
        assert_eq!(utilization(dec!(1), dec!(4)), Ok(dec!(25)));
    }

    #[test]
    fn utilization_is_not_clamped() {
        assert_eq!(utilization(dec!(150), dec!(100)), Ok(dec!(150)));
    }

    #[test]
    fn zero_rate_has_zero_apy() {
        assert_eq!(rate_to_apy(Decimal::ZERO, 1), Ok(Decimal::ZERO));
        assert_eq!(rate_to_apy(Decimal::ZERO, 12), Ok(Decimal::ZERO));
        assert_eq!(rate_to_apy(Decimal::ZERO, SECONDS_PER_YEAR), Ok(Decimal::ZERO));
    }

    #[test]
    fn single_period_apy_is_the_rate() {
        assert_eq!(rate_to_apy(dec!(0.05), 1), Ok(dec!(5.00)));
    }

    #[test]
    fn monthly_compounding_matches_closed_form() {
        let apy = rate_to_apy(dec!(0.01), 12).expect("apy");
        // 1.01^12 - 1 = 0.12682503013196972...
        assert!((apy - dec!(12.682503013196972)).abs() < dec!(0.000000001));
    }

    #[test]
    fn huge_rate_reports_overflow() {
        let err = rate_to_apy(dec!(1000), SECONDS_PER_YEAR).expect_err("should overflow");
        assert_eq!(err, CalculationError::Overflow { what: "apy" });
    }

    #[test]
    fn scales_usdc_amounts() {
        assert_eq!(scale_fixed_point(U256::from(1_000_000u64), 6), Ok(dec!(1.0)));
        assert_eq!(
            scale_fixed_point(U256::from(123_456_789u64), 6),
            Ok(dec!(123.456789))
        );
    }

    #[test]
    fn scales_eighteen_decimal_amounts_without_rounding() {
        let raw = U256::from(1_234_567_890_123_456_789_012u128);
        assert_eq!(
            scale_fixed_point(raw, 18),
            Ok(dec!(1234.567890123456789012))
        );
    }

    #[test]
    fn rejects_unrepresentable_amounts() {
        assert_eq!(
            scale_fixed_point(U256::MAX, 0),
            Err(CalculationError::Overflow {
                what: "fixed-point amount"
            })
        );
        assert_eq!(
            scale_fixed_point(U256::from(1u8), 30),
            Err(CalculationError::ScaleTooLarge(30))
        );
    }

    #[test]
    fn ray_rate_compounds_per_second() {
        // 5% APR in RAY = 5e25
        let rate = U256::from(50_000_000_000_000_000_000_000_000u128);
        let apy = ray_rate_to_apy(rate).expect("apy");
        // continuous limit e^0.05 - 1 = 5.1271096%
        assert!(apy > dec!(5.127) && apy < dec!(5.128), "apy = {apy}");
    }

    #[test]
    fn fraction_converts_to_percent() {
        assert_eq!(fraction_to_percent(dec!(0.0412)), dec!(4.12));
    }
}
