use cast::i128;
use soroban_sdk::{panic_with_error, Address, Env};

use crate::{
    constants::{
        HEALTH_FACTOR_LIQUIDATION_THRESHOLD, LEVERAGE_ONE, PERCENTAGE_FACTOR, VARIABLE_RATE_MODE,
    },
    errors::PoolError,
    math::{percent_div, percent_mul, require_some},
    pool::{
        balance_decrease_allowed, calculate_user_account_data, Pool, Reserve, UserConfiguration,
    },
    storage::Position,
};

/// Require that an incoming amount is not negative
///
/// ### Arguments
/// * `amount` - The amount to check
///
/// ### Panics
/// If the number is negative
pub fn require_nonnegative(e: &Env, amount: &i128) {
    if amount.is_negative() {
        panic_with_error!(e, PoolError::NegativeAmountError);
    }
}

fn require_positive_amount(e: &Env, amount: i128) {
    require_nonnegative(e, &amount);
    if amount == 0 {
        panic_with_error!(e, PoolError::InvalidAmount);
    }
}

fn require_active(e: &Env, reserve: &Reserve) {
    if !reserve.config.active {
        panic_with_error!(e, PoolError::ReserveInactive);
    }
}

fn require_active_not_frozen(e: &Env, reserve: &Reserve) {
    require_active(e, reserve);
    if reserve.config.frozen {
        panic_with_error!(e, PoolError::ReserveFrozen);
    }
}

fn require_available_liquidity(e: &Env, reserve: &Reserve, amount: i128) {
    if reserve.available_liquidity(e) < amount {
        panic_with_error!(e, PoolError::NotEnoughAvailableLiquidity);
    }
}

/// Validate a deposit
///
/// ### Panics
/// If the amount is not positive or the reserve is inactive or frozen
pub fn validate_deposit(e: &Env, reserve: &Reserve, amount: i128) {
    require_positive_amount(e, amount);
    require_active_not_frozen(e, reserve);
}

/// Validate a withdrawal
///
/// ### Arguments
/// * `amount` - The amount of the underlying to withdraw
/// * `user_balance` - The user's current supply balance in the underlying
///
/// ### Panics
/// If the amount is not positive or exceeds the balance, the reserve is inactive, or the
/// user's health factor would drop below the liquidation boundary
#[allow(clippy::too_many_arguments)]
pub fn validate_withdraw(
    e: &Env,
    pool: &mut Pool,
    reserve: &Reserve,
    user: &Address,
    amount: i128,
    user_balance: i128,
    user_config: &UserConfiguration,
) {
    require_positive_amount(e, amount);
    if amount > user_balance {
        panic_with_error!(e, PoolError::InsufficientBalance);
    }
    require_active(e, reserve);
    if !balance_decrease_allowed(e, pool, &reserve.asset, user, amount, user_config) {
        panic_with_error!(e, PoolError::BalanceDecreaseNotAllowed);
    }
}

/// Validate a borrow
///
/// ### Arguments
/// * `amount` - The amount of the underlying to borrow
/// * `rate_mode` - The requested interest rate mode
///
/// ### Panics
/// If the reserve does not allow borrowing, the amount is not positive, the rate mode is not
/// supported, or the user's collateral does not cover the new debt
#[allow(clippy::too_many_arguments)]
pub fn validate_borrow(
    e: &Env,
    pool: &mut Pool,
    reserve: &Reserve,
    user: &Address,
    amount: i128,
    rate_mode: u32,
    user_config: &UserConfiguration,
) {
    require_active_not_frozen(e, reserve);
    if !reserve.config.borrowing_enabled {
        panic_with_error!(e, PoolError::BorrowingNotEnabled);
    }
    require_positive_amount(e, amount);
    if rate_mode != VARIABLE_RATE_MODE {
        panic_with_error!(e, PoolError::InvalidInterestRateMode);
    }

    let account = calculate_user_account_data(e, pool, user, user_config);
    if account.total_collateral == 0 {
        panic_with_error!(e, PoolError::CollateralBalanceZero);
    }
    if account.health_factor <= HEALTH_FACTOR_LIQUIDATION_THRESHOLD {
        panic_with_error!(e, PoolError::HealthFactorTooLow);
    }
    if account.avg_ltv == 0 {
        panic_with_error!(e, PoolError::LtvValidationFailed);
    }

    let price = pool.load_price(e, &reserve.asset);
    let amount_value = reserve.to_base_up(e, amount, price);
    let collateral_needed = percent_div(
        e,
        require_some(e, account.total_debt.checked_add(amount_value)),
        account.avg_ltv,
    );
    if collateral_needed > account.total_collateral {
        panic_with_error!(e, PoolError::InsufficientCollateral);
    }

    require_available_liquidity(e, reserve, amount);
}

/// Validate a repayment
///
/// ### Arguments
/// * `amount` - The requested repayment, i128::MAX to repay the full debt
/// * `rate_mode` - The interest rate mode of the debt
/// * `from` - The address paying
/// * `on_behalf_of` - The address whose debt is repaid
/// * `variable_debt` - The current debt of `on_behalf_of`
///
/// ### Panics
/// If the reserve is inactive, the amount is not positive, there is no debt of the mode, or
/// a full repayment is requested on behalf of another address
pub fn validate_repay(
    e: &Env,
    reserve: &Reserve,
    amount: i128,
    rate_mode: u32,
    from: &Address,
    on_behalf_of: &Address,
    variable_debt: i128,
) {
    require_active(e, reserve);
    require_positive_amount(e, amount);
    if rate_mode != VARIABLE_RATE_MODE {
        panic_with_error!(e, PoolError::InvalidInterestRateMode);
    }
    if variable_debt == 0 {
        panic_with_error!(e, PoolError::NoDebtOfSelectedType);
    }
    if amount == i128::MAX && from != on_behalf_of {
        panic_with_error!(e, PoolError::NoExplicitAmountToRepayOnBehalf);
    }
}

/// Validate toggling a reserve as collateral
///
/// ### Arguments
/// * `underlying_balance` - The user's supply balance in the underlying
/// * `use_as_collateral` - The requested flag
///
/// ### Panics
/// If the user has no supply, or disabling the collateral would drop the user's health
/// factor below the liquidation boundary
pub fn validate_set_use_as_collateral(
    e: &Env,
    pool: &mut Pool,
    reserve: &Reserve,
    user: &Address,
    underlying_balance: i128,
    use_as_collateral: bool,
    user_config: &UserConfiguration,
) {
    if underlying_balance <= 0 {
        panic_with_error!(e, PoolError::UnderlyingBalanceZero);
    }
    if !use_as_collateral
        && !balance_decrease_allowed(
            e,
            pool,
            &reserve.asset,
            user,
            underlying_balance,
            user_config,
        )
    {
        panic_with_error!(e, PoolError::CollateralInUse);
    }
}

/// Validate the sender of a supply token transfer. The pool must already reflect the
/// sender's post-transfer balance.
///
/// ### Panics
/// If the sender's health factor is below the liquidation boundary
pub fn validate_transfer(e: &Env, pool: &mut Pool, user: &Address, user_config: &UserConfiguration) {
    let account = calculate_user_account_data(e, pool, user, user_config);
    if !account.is_healthy() {
        panic_with_error!(e, PoolError::TransferNotAllowed);
    }
}

/// Validate a change to a reserve's collateral parameters
///
/// ### Arguments
/// * `ltv` - The loan to value, where 10000 is 100%
/// * `liq_threshold` - The liquidation threshold, where 10000 is 100%
/// * `liq_bonus` - The liquidation bonus, where 10500 is a 5% bonus
/// * `has_liquidity` - If any supply exists in the reserve
///
/// ### Panics
/// If the parameters are inconsistent, or the reserve is disabled as collateral while it
/// holds supply
pub fn validate_collateral_config(
    e: &Env,
    ltv: u32,
    liq_threshold: u32,
    liq_bonus: u32,
    has_liquidity: bool,
) {
    if ltv > liq_threshold {
        panic_with_error!(e, PoolError::InvalidReserveParams);
    }
    if liq_threshold != 0 {
        if i128(liq_bonus) <= PERCENTAGE_FACTOR {
            panic_with_error!(e, PoolError::InvalidReserveParams);
        }
        if percent_mul(e, i128(liq_threshold), i128(liq_bonus)) > PERCENTAGE_FACTOR {
            panic_with_error!(e, PoolError::InvalidReserveParams);
        }
    } else {
        if liq_bonus != 0 {
            panic_with_error!(e, PoolError::InvalidReserveParams);
        }
        if has_liquidity {
            panic_with_error!(e, PoolError::ReserveLiquidityNotZero);
        }
    }
}

/// Validate opening a leveraged position
///
/// ### Arguments
/// * `margin_amount` - The margin supplied by the trader
/// * `borrow_amount` - The amount of the borrowed asset the position will draw
/// * `leverage` - The requested leverage, where 10000 is 1x
/// * `max_leverage` - The exclusive leverage cap
///
/// ### Panics
/// If the borrowed and held assets match, any leg's reserve is inactive or frozen, an amount
/// is not positive, borrowing is disabled, the leverage is out of range, or the reserve cannot
/// fund the borrow
#[allow(clippy::too_many_arguments)]
pub fn validate_open_position(
    e: &Env,
    margin_reserve: &Reserve,
    borrowed_reserve: &Reserve,
    held_reserve: &Reserve,
    margin_amount: i128,
    borrow_amount: i128,
    leverage: u32,
    max_leverage: u32,
) {
    if borrowed_reserve.asset == held_reserve.asset {
        panic_with_error!(e, PoolError::SameAssetPosition);
    }
    require_active_not_frozen(e, margin_reserve);
    require_active_not_frozen(e, borrowed_reserve);
    require_active_not_frozen(e, held_reserve);
    require_positive_amount(e, margin_amount);
    if leverage <= LEVERAGE_ONE || leverage >= max_leverage {
        panic_with_error!(e, PoolError::InvalidLeverage);
    }
    require_positive_amount(e, borrow_amount);
    if !borrowed_reserve.config.borrowing_enabled {
        panic_with_error!(e, PoolError::BorrowingNotEnabled);
    }
    require_available_liquidity(e, borrowed_reserve, borrow_amount);
}

/// Validate a voluntary close of a position
///
/// ### Panics
/// If the caller is not the trader or the position is closed
pub fn validate_close_position(e: &Env, position: &Position, caller: &Address) {
    if position.trader != *caller {
        panic_with_error!(e, PoolError::NotPositionOwner);
    }
    if !position.is_open {
        panic_with_error!(e, PoolError::PositionNotOpen);
    }
}

/// Validate a forced liquidation of a position
///
/// ### Arguments
/// * `health_factor` - The current health factor of the position
///
/// ### Panics
/// If the position is closed or healthy
pub fn validate_liquidate_position(e: &Env, position: &Position, health_factor: i128) {
    if !position.is_open {
        panic_with_error!(e, PoolError::PositionNotOpen);
    }
    if health_factor >= HEALTH_FACTOR_LIQUIDATION_THRESHOLD {
        panic_with_error!(e, PoolError::PositionNotLiquidatable);
    }
}

/// Validate a liquidation of a loan
///
/// ### Arguments
/// * `health_factor` - The current health factor of the borrower
/// * `user_debt` - The borrower's current debt in the debt asset
///
/// ### Panics
/// If a reserve is inactive, the borrower is healthy, the collateral cannot be seized, or
/// the borrower has no debt in the debt asset
pub fn validate_liquidation_call(
    e: &Env,
    collateral_reserve: &Reserve,
    debt_reserve: &Reserve,
    user_config: &UserConfiguration,
    health_factor: i128,
    user_debt: i128,
) {
    require_active(e, collateral_reserve);
    require_active(e, debt_reserve);
    if health_factor >= HEALTH_FACTOR_LIQUIDATION_THRESHOLD {
        panic_with_error!(e, PoolError::HealthFactorNotBelowThreshold);
    }
    if collateral_reserve.config.liq_threshold == 0
        || !user_config.is_collateral(collateral_reserve.config.index)
    {
        panic_with_error!(e, PoolError::CollateralCannotBeLiquidated);
    }
    if user_debt == 0 {
        panic_with_error!(e, PoolError::CurrencyNotBorrowed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::WAD, testutils};
    use soroban_sdk::testutils::Address as _;

    #[test]
    #[should_panic(expected = "Error(Contract, #8)")]
    fn test_require_nonnegative() {
        let e = Env::default();
        require_nonnegative(&e, &-1);
    }

    #[test]
    fn test_validate_deposit() {
        let e = Env::default();
        let reserve = testutils::default_reserve(&e);
        validate_deposit(&e, &reserve, 1);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1200)")]
    fn test_validate_deposit_zero_amount() {
        let e = Env::default();
        let reserve = testutils::default_reserve(&e);
        validate_deposit(&e, &reserve, 0);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1210)")]
    fn test_validate_deposit_inactive() {
        let e = Env::default();
        let mut reserve = testutils::default_reserve(&e);
        reserve.config.active = false;
        validate_deposit(&e, &reserve, 100);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1211)")]
    fn test_validate_deposit_frozen() {
        let e = Env::default();
        let mut reserve = testutils::default_reserve(&e);
        reserve.config.frozen = true;
        validate_deposit(&e, &reserve, 100);
    }

    #[test]
    fn test_validate_repay() {
        let e = Env::default();
        let reserve = testutils::default_reserve(&e);
        let samwise = Address::generate(&e);
        let frodo = Address::generate(&e);
        validate_repay(&e, &reserve, i128::MAX, 2, &samwise, &samwise, 10);
        validate_repay(&e, &reserve, 5, 2, &samwise, &frodo, 10);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1228)")]
    fn test_validate_repay_no_debt() {
        let e = Env::default();
        let reserve = testutils::default_reserve(&e);
        let samwise = Address::generate(&e);
        validate_repay(&e, &reserve, 5, 2, &samwise, &samwise, 0);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1201)")]
    fn test_validate_repay_stable_mode() {
        let e = Env::default();
        let reserve = testutils::default_reserve(&e);
        let samwise = Address::generate(&e);
        validate_repay(&e, &reserve, 5, 1, &samwise, &samwise, 10);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1202)")]
    fn test_validate_repay_max_on_behalf() {
        let e = Env::default();
        let reserve = testutils::default_reserve(&e);
        let samwise = Address::generate(&e);
        let frodo = Address::generate(&e);
        validate_repay(&e, &reserve, i128::MAX, 2, &samwise, &frodo, 10);
    }

    #[test]
    fn test_validate_collateral_config() {
        let e = Env::default();
        validate_collateral_config(&e, 6000, 6500, 10500, true);
        validate_collateral_config(&e, 0, 0, 0, false);
        // threshold * bonus exactly 100%
        validate_collateral_config(&e, 8000, 8000, 12500, true);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1216)")]
    fn test_validate_collateral_config_ltv_above_threshold() {
        let e = Env::default();
        validate_collateral_config(&e, 7000, 6500, 10500, false);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1216)")]
    fn test_validate_collateral_config_bonus_not_above_one() {
        let e = Env::default();
        validate_collateral_config(&e, 6000, 6500, 10000, false);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1216)")]
    fn test_validate_collateral_config_bonus_exceeds_collateral() {
        let e = Env::default();
        validate_collateral_config(&e, 8000, 9000, 11200, false);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1216)")]
    fn test_validate_collateral_config_bonus_without_threshold() {
        let e = Env::default();
        validate_collateral_config(&e, 0, 0, 10500, false);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1217)")]
    fn test_validate_collateral_config_disable_with_liquidity() {
        let e = Env::default();
        validate_collateral_config(&e, 0, 0, 0, true);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1241)")]
    fn test_validate_open_position_same_asset() {
        let e = Env::default();
        let margin = testutils::default_reserve(&e);
        let borrowed = testutils::default_reserve(&e);
        validate_open_position(&e, &margin, &borrowed, &borrowed, 100, 200, 2_0000, 5_0000);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1211)")]
    fn test_validate_open_position_frozen_held() {
        let e = Env::default();
        let margin = testutils::default_reserve(&e);
        let borrowed = testutils::default_reserve(&e);
        let mut held = testutils::default_reserve(&e);
        held.config.frozen = true;
        validate_open_position(&e, &margin, &borrowed, &held, 100, 200, 2_0000, 5_0000);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1240)")]
    fn test_validate_open_position_leverage_at_max() {
        let e = Env::default();
        let margin = testutils::default_reserve(&e);
        let borrowed = testutils::default_reserve(&e);
        let held = testutils::default_reserve(&e);
        validate_open_position(&e, &margin, &borrowed, &held, 100, 500, 5_0000, 5_0000);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1240)")]
    fn test_validate_open_position_leverage_at_one() {
        let e = Env::default();
        let margin = testutils::default_reserve(&e);
        let borrowed = testutils::default_reserve(&e);
        let held = testutils::default_reserve(&e);
        validate_open_position(&e, &margin, &borrowed, &held, 100, 100, 1_0000, 5_0000);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1212)")]
    fn test_validate_open_position_borrowing_disabled() {
        let e = Env::default();
        let margin = testutils::default_reserve(&e);
        let mut borrowed = testutils::default_reserve(&e);
        borrowed.config.borrowing_enabled = false;
        let held = testutils::default_reserve(&e);
        validate_open_position(&e, &margin, &borrowed, &held, 100, 200, 2_0000, 5_0000);
    }

    fn position(e: &Env, trader: &Address, is_open: bool) -> Position {
        Position {
            id: 7,
            trader: trader.clone(),
            margin_asset: Address::generate(e),
            borrowed_asset: Address::generate(e),
            held_asset: Address::generate(e),
            margin_amount: 100,
            borrowed_amount: 200,
            held_amount: 200,
            scaled_debt: 200,
            liq_threshold: 0,
            opened_at: 0,
            is_open,
        }
    }

    #[test]
    fn test_validate_close_position() {
        let e = Env::default();
        let samwise = Address::generate(&e);
        validate_close_position(&e, &position(&e, &samwise, true), &samwise);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1244)")]
    fn test_validate_close_position_not_owner() {
        let e = Env::default();
        let samwise = Address::generate(&e);
        let frodo = Address::generate(&e);
        validate_close_position(&e, &position(&e, &samwise, true), &frodo);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1243)")]
    fn test_validate_close_position_already_closed() {
        let e = Env::default();
        let samwise = Address::generate(&e);
        validate_close_position(&e, &position(&e, &samwise, false), &samwise);
    }

    #[test]
    fn test_validate_liquidate_position() {
        let e = Env::default();
        let samwise = Address::generate(&e);
        validate_liquidate_position(&e, &position(&e, &samwise, true), WAD - 1);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1245)")]
    fn test_validate_liquidate_position_healthy() {
        let e = Env::default();
        let samwise = Address::generate(&e);
        validate_liquidate_position(&e, &position(&e, &samwise, true), WAD);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1243)")]
    fn test_validate_liquidate_position_closed() {
        let e = Env::default();
        let samwise = Address::generate(&e);
        validate_liquidate_position(&e, &position(&e, &samwise, false), 0);
    }

    #[test]
    fn test_validate_liquidation_call() {
        let e = Env::default();
        let collateral = testutils::default_reserve(&e);
        let mut debt = testutils::default_reserve(&e);
        debt.config.index = 1;
        let mut user_config = UserConfiguration::default();
        user_config.set_collateral(0, true);
        user_config.set_borrowing(1, true);
        validate_liquidation_call(&e, &collateral, &debt, &user_config, WAD - 1, 10);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1230)")]
    fn test_validate_liquidation_call_healthy() {
        let e = Env::default();
        let collateral = testutils::default_reserve(&e);
        let debt = testutils::default_reserve(&e);
        let mut user_config = UserConfiguration::default();
        user_config.set_collateral(0, true);
        validate_liquidation_call(&e, &collateral, &debt, &user_config, WAD, 10);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1231)")]
    fn test_validate_liquidation_call_not_collateral() {
        let e = Env::default();
        let collateral = testutils::default_reserve(&e);
        let debt = testutils::default_reserve(&e);
        let user_config = UserConfiguration::default();
        validate_liquidation_call(&e, &collateral, &debt, &user_config, WAD - 1, 10);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1232)")]
    fn test_validate_liquidation_call_no_debt() {
        let e = Env::default();
        let collateral = testutils::default_reserve(&e);
        let debt = testutils::default_reserve(&e);
        let mut user_config = UserConfiguration::default();
        user_config.set_collateral(0, true);
        validate_liquidation_call(&e, &collateral, &debt, &user_config, WAD - 1, 0);
    }
}
