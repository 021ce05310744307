use soroban_sdk::{panic_with_error, Env, I256};

use crate::{
    constants::{HALF_PERCENT, HALF_RAY, PERCENTAGE_FACTOR, RAY},
    errors::StrategyError,
};

/// Multiply `a` by `b` and divide by `denominator`, rounding half up
fn mul_div_half_up(e: &Env, a: i128, b: i128, half: i128, denominator: i128) -> i128 {
    if denominator == 0 {
        panic_with_error!(e, StrategyError::ArithmeticOverflow);
    }
    let result = I256::from_i128(e, a)
        .mul(&I256::from_i128(e, b))
        .add(&I256::from_i128(e, half))
        .div(&I256::from_i128(e, denominator));
    match result.to_i128() {
        Some(value) => value,
        None => panic_with_error!(e, StrategyError::ArithmeticOverflow),
    }
}

pub fn ray_mul(e: &Env, a: i128, b: i128) -> i128 {
    mul_div_half_up(e, a, b, HALF_RAY, RAY)
}

pub fn ray_div(e: &Env, a: i128, b: i128) -> i128 {
    mul_div_half_up(e, a, RAY, b / 2, b)
}

pub fn percent_mul(e: &Env, value: i128, percentage: i128) -> i128 {
    mul_div_half_up(e, value, percentage, HALF_PERCENT, PERCENTAGE_FACTOR)
}
