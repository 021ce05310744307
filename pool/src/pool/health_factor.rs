use cast::i128;
use soroban_sdk::{contracttype, Address, Env};

use crate::{
    constants::HEALTH_FACTOR_LIQUIDATION_THRESHOLD,
    math::{percent_mul, ray_mul, require_some, wad_div},
    storage::{self, Position},
};

use super::{pool::Pool, user_config::UserConfiguration};

/// The cross reserve account summary of a user. Values are denominated in the oracle's
/// base asset.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct AccountData {
    pub total_collateral: i128,
    pub total_debt: i128,
    pub available_borrows: i128,
    pub avg_ltv: i128,            // collateral weighted loan to value, where 10000 is 100%
    pub avg_liq_threshold: i128,  // collateral weighted liquidation threshold, where 10000 is 100%
    pub health_factor: i128,      // expressed as a wad, i128::MAX without debt
}

impl AccountData {
    /// Check if the account is at or above the liquidation boundary
    pub fn is_healthy(&self) -> bool {
        self.health_factor >= HEALTH_FACTOR_LIQUIDATION_THRESHOLD
    }
}

/// Calculate the account summary of a user across every reserve they have flagged
///
/// Supply balances only count as collateral when the reserve has a nonzero liquidation
/// threshold and the user is using it as collateral.
///
/// ### Arguments
/// * pool - The pool
/// * user - The address of the user
/// * user_config - The flags of the user
pub fn calculate_user_account_data(
    e: &Env,
    pool: &mut Pool,
    user: &Address,
    user_config: &UserConfiguration,
) -> AccountData {
    if user_config.is_empty() {
        return AccountData {
            total_collateral: 0,
            total_debt: 0,
            available_borrows: 0,
            avg_ltv: 0,
            avg_liq_threshold: 0,
            health_factor: i128::MAX,
        };
    }

    let reserve_list = storage::get_res_list(e);
    let mut total_collateral: i128 = 0;
    let mut total_debt: i128 = 0;
    let mut ltv_sum: i128 = 0;
    let mut liq_threshold_sum: i128 = 0;
    for i in 0..reserve_list.len() {
        if !user_config.is_using_reserve(i) {
            continue;
        }
        let reserve = pool.load_reserve(e, &reserve_list.get_unchecked(i));
        let price = pool.load_price(e, &reserve.asset);

        if reserve.config.liq_threshold != 0 && user_config.is_collateral(i) {
            let balance = pool.load_supply_balance(e, &reserve, user);
            let value = reserve.to_base_down(e, balance, price);
            total_collateral = require_some(e, total_collateral.checked_add(value));
            ltv_sum = require_some(
                e,
                value
                    .checked_mul(i128(reserve.config.ltv))
                    .and_then(|v| v.checked_add(ltv_sum)),
            );
            liq_threshold_sum = require_some(
                e,
                value
                    .checked_mul(i128(reserve.config.liq_threshold))
                    .and_then(|v| v.checked_add(liq_threshold_sum)),
            );
        }

        if user_config.is_borrowing(i) {
            let debt = pool.load_debt_balance(e, &reserve, user);
            let value = reserve.to_base_up(e, debt, price);
            total_debt = require_some(e, total_debt.checked_add(value));
        }

        pool.cache_reserve(reserve, false);
    }

    let (avg_ltv, avg_liq_threshold) = if total_collateral > 0 {
        (ltv_sum / total_collateral, liq_threshold_sum / total_collateral)
    } else {
        (0, 0)
    };

    AccountData {
        total_collateral,
        total_debt,
        available_borrows: calculate_available_borrows(e, total_collateral, total_debt, avg_ltv),
        avg_ltv,
        avg_liq_threshold,
        health_factor: calculate_health_factor(e, total_collateral, total_debt, avg_liq_threshold),
    }
}

/// Calculate a health factor from account totals
///
/// ### Returns
/// The health factor as a wad, or i128::MAX if there is no debt
pub fn calculate_health_factor(
    e: &Env,
    total_collateral: i128,
    total_debt: i128,
    liq_threshold: i128,
) -> i128 {
    if total_debt == 0 {
        return i128::MAX;
    }
    wad_div(e, percent_mul(e, total_collateral, liq_threshold), total_debt)
}

/// Calculate how much more value can be borrowed against the collateral, floored at zero
pub fn calculate_available_borrows(
    e: &Env,
    total_collateral: i128,
    total_debt: i128,
    ltv: i128,
) -> i128 {
    let max_debt = percent_mul(e, total_collateral, ltv);
    if max_debt <= total_debt {
        0
    } else {
        max_debt - total_debt
    }
}

/// Check if `amount` of the user's supply of `asset` can be removed while the user stays at or
/// above the liquidation boundary
///
/// ### Arguments
/// * pool - The pool
/// * asset - The address of the underlying asset
/// * user - The address of the user
/// * amount - The amount of the underlying being removed
/// * user_config - The flags of the user
pub fn balance_decrease_allowed(
    e: &Env,
    pool: &mut Pool,
    asset: &Address,
    user: &Address,
    amount: i128,
    user_config: &UserConfiguration,
) -> bool {
    let reserve = pool.load_reserve(e, asset);
    if !user_config.is_borrowing_any() || !user_config.is_collateral(reserve.config.index) {
        return true;
    }
    if reserve.config.liq_threshold == 0 {
        return true;
    }

    let account = calculate_user_account_data(e, pool, user, user_config);
    if account.total_debt == 0 {
        return true;
    }

    let price = pool.load_price(e, asset);
    let decrease_value = reserve.to_base_down(e, amount, price);
    let collateral_after = account.total_collateral - decrease_value;
    if collateral_after <= 0 {
        return false;
    }

    let liq_threshold_after = require_some(
        e,
        account
            .total_collateral
            .checked_mul(account.avg_liq_threshold)
            .and_then(|v| {
                decrease_value
                    .checked_mul(i128(reserve.config.liq_threshold))
                    .and_then(|d| v.checked_sub(d))
            }),
    ) / collateral_after;

    let health_factor_after =
        calculate_health_factor(e, collateral_after, account.total_debt, liq_threshold_after);
    health_factor_after >= HEALTH_FACTOR_LIQUIDATION_THRESHOLD
}

/********** Positions **********/

/// The legs of a leveraged position denominated in the oracle's base asset
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionValues {
    pub margin: i128,
    pub held: i128,
    pub borrowed: i128, // includes accrued interest
}

impl PositionValues {
    /// Value each leg of a position at the current oracle prices
    ///
    /// ### Arguments
    /// * pool - The pool
    /// * position - The position to value
    pub fn load(e: &Env, pool: &mut Pool, position: &Position) -> Self {
        let margin_reserve = pool.load_reserve(e, &position.margin_asset);
        let margin_price = pool.load_price(e, &position.margin_asset);
        let margin = margin_reserve.to_base_down(e, position.margin_amount, margin_price);

        let held_reserve = pool.load_reserve(e, &position.held_asset);
        let held_price = pool.load_price(e, &position.held_asset);
        let held = held_reserve.to_base_down(e, position.held_amount, held_price);

        let borrowed_reserve = pool.load_reserve(e, &position.borrowed_asset);
        let borrowed_price = pool.load_price(e, &position.borrowed_asset);
        let owed = ray_mul(e, position.scaled_debt, borrowed_reserve.normalized_debt(e));
        let borrowed = borrowed_reserve.to_base_up(e, owed, borrowed_price);

        pool.cache_reserve(margin_reserve, false);
        pool.cache_reserve(held_reserve, false);
        pool.cache_reserve(borrowed_reserve, false);
        PositionValues {
            margin,
            held,
            borrowed,
        }
    }
}

/// Calculate the health factor of a leveraged position
///
/// The equity of the position (margin + held - borrowed) is compared against the margin
/// scaled by the position's liquidation threshold.
///
/// ### Returns
/// The health factor as a wad, or 0 if the position has no equity
pub fn calculate_position_health_factor(e: &Env, pool: &mut Pool, position: &Position) -> i128 {
    let values = PositionValues::load(e, pool, position);
    let equity = values.margin + values.held - values.borrowed;
    if equity <= 0 {
        return 0;
    }
    let threshold_value = ray_mul(e, values.margin, position.liq_threshold);
    if threshold_value == 0 {
        return i128::MAX;
    }
    wad_div(e, equity, threshold_value)
}

/// Calculate the profit and loss of a leveraged position, the held value less the borrowed value
pub fn get_pnl(e: &Env, pool: &mut Pool, position: &Position) -> i128 {
    let values = PositionValues::load(e, pool, position);
    values.held - values.borrowed
}
