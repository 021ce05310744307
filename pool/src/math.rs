use cast::i128;
use soroban_sdk::{panic_with_error, Env, I256};

use crate::{
    constants::{
        HALF_PERCENT, HALF_RAY, HALF_WAD, PERCENTAGE_FACTOR, RAY, SECONDS_PER_YEAR, WAD,
        WAD_RAY_RATIO,
    },
    errors::PoolError,
};

/// Unwrap a checked arithmetic result, or panic with an overflow error
pub fn require_some(e: &Env, value: Option<i128>) -> i128 {
    value.unwrap_or_else(|| panic_with_error!(e, PoolError::ArithmeticOverflow))
}

/// Compute `(a * b + rounding) / denominator` with a 256 bit intermediate
///
/// ### Panics
/// If the denominator is zero or the result does not fit in an i128
fn mul_div(e: &Env, a: i128, b: i128, rounding: i128, denominator: i128) -> i128 {
    if denominator == 0 {
        panic_with_error!(e, PoolError::DivisionByZero);
    }
    let result = I256::from_i128(e, a)
        .mul(&I256::from_i128(e, b))
        .add(&I256::from_i128(e, rounding))
        .div(&I256::from_i128(e, denominator));
    require_some(e, result.to_i128())
}

/********** Ray **********/

/// Multiply two ray numbers, rounding half up
pub fn ray_mul(e: &Env, a: i128, b: i128) -> i128 {
    if a == 0 || b == 0 {
        return 0;
    }
    mul_div(e, a, b, HALF_RAY, RAY)
}

/// Divide two ray numbers, rounding half up
///
/// ### Panics
/// If `b` is zero
pub fn ray_div(e: &Env, a: i128, b: i128) -> i128 {
    mul_div(e, a, RAY, b / 2, b)
}

/// Convert a ray number to a wad number, rounding half up
pub fn ray_to_wad(e: &Env, a: i128) -> i128 {
    require_some(e, a.checked_add(WAD_RAY_RATIO / 2)) / WAD_RAY_RATIO
}

/// Convert a wad number to a ray number
pub fn wad_to_ray(e: &Env, a: i128) -> i128 {
    require_some(e, a.checked_mul(WAD_RAY_RATIO))
}

/********** Wad **********/

/// Multiply two wad numbers, rounding half up
pub fn wad_mul(e: &Env, a: i128, b: i128) -> i128 {
    if a == 0 || b == 0 {
        return 0;
    }
    mul_div(e, a, b, HALF_WAD, WAD)
}

/// Divide two wad numbers, rounding half up
///
/// ### Panics
/// If `b` is zero
pub fn wad_div(e: &Env, a: i128, b: i128) -> i128 {
    mul_div(e, a, WAD, b / 2, b)
}

/********** Percentage **********/

/// Apply a percentage (10000 = 100.00%) to a value, rounding half up
pub fn percent_mul(e: &Env, value: i128, percentage: i128) -> i128 {
    if value == 0 || percentage == 0 {
        return 0;
    }
    mul_div(e, value, percentage, HALF_PERCENT, PERCENTAGE_FACTOR)
}

/// Divide a value by a percentage (10000 = 100.00%), rounding half up
///
/// ### Panics
/// If `percentage` is zero
pub fn percent_div(e: &Env, value: i128, percentage: i128) -> i128 {
    mul_div(e, value, PERCENTAGE_FACTOR, percentage / 2, percentage)
}

/********** Interest **********/

fn seconds_since(e: &Env, last_time: u64) -> i128 {
    i128(e.ledger().timestamp().saturating_sub(last_time))
}

/// Calculate the growth factor of a linearly accruing rate since `last_time`
///
/// ### Arguments
/// * `rate` - The annual rate expressed as a ray
/// * `last_time` - The timestamp interest was last accrued
///
/// ### Returns
/// The growth factor expressed as a ray, exactly one ray if no time passed
pub fn linear_interest(e: &Env, rate: i128, last_time: u64) -> i128 {
    let delta = seconds_since(e, last_time);
    let accrued = mul_div(e, rate, delta, 0, SECONDS_PER_YEAR);
    require_some(e, RAY.checked_add(accrued))
}

/// Calculate the growth factor of a rate compounded every second since `last_time`
///
/// Uses the first three terms of the binomial expansion of `(1 + rate / year)^seconds`,
/// which slightly underestimates the exact value for the benefit of borrowers.
///
/// ### Arguments
/// * `rate` - The annual rate expressed as a ray
/// * `last_time` - The timestamp interest was last accrued
///
/// ### Returns
/// The growth factor expressed as a ray, exactly one ray if no time passed
pub fn compounded_interest(e: &Env, rate: i128, last_time: u64) -> i128 {
    let exp = seconds_since(e, last_time);
    if exp == 0 {
        return RAY;
    }
    let exp_minus_one = exp - 1;
    let exp_minus_two = if exp > 2 { exp - 2 } else { 0 };

    let rate_per_second = rate / SECONDS_PER_YEAR;
    let base_power_two = ray_mul(e, rate_per_second, rate_per_second);
    let base_power_three = ray_mul(e, base_power_two, rate_per_second);

    let second_term = require_some(
        e,
        exp.checked_mul(exp_minus_one)
            .and_then(|v| v.checked_mul(base_power_two)),
    ) / 2;
    let third_term = require_some(
        e,
        exp.checked_mul(exp_minus_one)
            .and_then(|v| v.checked_mul(exp_minus_two))
            .and_then(|v| v.checked_mul(base_power_three)),
    ) / 6;

    require_some(
        e,
        rate_per_second
            .checked_mul(exp)
            .and_then(|v| v.checked_add(RAY))
            .and_then(|v| v.checked_add(second_term))
            .and_then(|v| v.checked_add(third_term)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::testutils::{Ledger, LedgerInfo};

    fn set_time(e: &Env, timestamp: u64) {
        e.ledger().set(LedgerInfo {
            timestamp,
            protocol_version: 20,
            sequence_number: 1234,
            network_id: Default::default(),
            base_reserve: 10,
            min_temp_entry_ttl: 10,
            min_persistent_entry_ttl: 10,
            max_entry_ttl: 2000000,
        });
    }

    #[test]
    fn test_ray_mul_rounds_half_up() {
        let e = Env::default();
        assert_eq!(ray_mul(&e, 1, HALF_RAY), 1);
        assert_eq!(ray_mul(&e, 1, HALF_RAY - 1), 0);
        assert_eq!(ray_mul(&e, 3 * RAY, 2 * RAY), 6 * RAY);
        assert_eq!(ray_mul(&e, 0, i128::MAX), 0);
    }

    #[test]
    fn test_ray_div_rounds_half_up() {
        let e = Env::default();
        // 1.5 -> 2
        assert_eq!(ray_div(&e, 3, 2 * RAY), 2);
        // 1.25 -> 1
        assert_eq!(ray_div(&e, 5, 4 * RAY), 1);
        assert_eq!(ray_div(&e, RAY, 4 * RAY), RAY / 4);
    }

    #[test]
    fn test_wad_ops() {
        let e = Env::default();
        assert_eq!(wad_mul(&e, 2 * WAD, 3 * WAD), 6 * WAD);
        assert_eq!(wad_div(&e, 650, 500), 1_300_000_000_000_000_000);
        assert_eq!(ray_to_wad(&e, RAY + WAD_RAY_RATIO / 2), WAD + 1);
        assert_eq!(wad_to_ray(&e, WAD), RAY);
    }

    #[test]
    fn test_percentage_ops() {
        let e = Env::default();
        // 5000.5 -> 5001
        assert_eq!(percent_mul(&e, 10001, 5000), 5001);
        assert_eq!(percent_mul(&e, 1000_0000000, 6500), 650_0000000);
        assert_eq!(percent_mul(&e, 0, 6500), 0);
        // 3.33 -> 3
        assert_eq!(percent_div(&e, 2, 6000), 3);
        assert_eq!(percent_div(&e, 1000, 3), 3333333);
        assert_eq!(percent_div(&e, 500_0000000, 6000), 833_3333333);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #12)")]
    fn test_ray_mul_overflow() {
        let e = Env::default();
        ray_mul(&e, i128::MAX / 2, 4 * RAY);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1270)")]
    fn test_percent_div_by_zero() {
        let e = Env::default();
        percent_div(&e, 100, 0);
    }

    #[test]
    fn test_interest_zero_elapsed_is_one() {
        let e = Env::default();
        set_time(&e, 1000);
        assert_eq!(linear_interest(&e, RAY / 10, 1000), RAY);
        assert_eq!(compounded_interest(&e, RAY / 10, 1000), RAY);
    }

    #[test]
    fn test_linear_interest_one_year() {
        let e = Env::default();
        set_time(&e, 31536000);
        assert_eq!(linear_interest(&e, RAY / 10, 0), RAY + RAY / 10);
        // half a year
        assert_eq!(
            linear_interest(&e, RAY / 10, 31536000 / 2),
            RAY + RAY / 20
        );
    }

    #[test]
    fn test_compounded_interest_one_year() {
        let e = Env::default();
        set_time(&e, 31536000);
        let linear = linear_interest(&e, RAY / 10, 0);
        let compounded = compounded_interest(&e, RAY / 10, 0);
        // e^0.1 ~= 1.10517
        assert!(compounded > linear);
        assert!(compounded > 1_105_160_000_000_000_000_000_000_000);
        assert!(compounded < 1_105_170_000_000_000_000_000_000_000);
    }
}
