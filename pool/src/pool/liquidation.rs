use cast::i128;
use sep_41_token::TokenClient;
use soroban_sdk::{panic_with_error, Address, Env};

use crate::{
    constants::LIQUIDATION_CLOSE_FACTOR,
    dependencies::{DTokenClient, STokenClient},
    errors::PoolError,
    math::{percent_div, percent_mul},
    validator::{require_nonnegative, validate_liquidation_call},
};

use super::{
    health_factor::calculate_user_account_data, pool::Pool, reserve::Reserve,
    user_config::UserConfiguration,
};

/// Liquidates loans that fell below the liquidation boundary
pub trait LiquidationManager {
    /// Repay part of the `debt_asset` debt of `user` on behalf of `liquidator` in exchange for
    /// the user's `collateral_asset` supply plus the reserve's liquidation bonus
    ///
    /// ### Arguments
    /// * `debt_to_cover` - The maximum amount of debt the liquidator will repay
    /// * `receive_s_token` - If the liquidator receives the collateral as supply instead of
    ///                       the underlying
    ///
    /// Returns (debt repaid, collateral seized)
    #[allow(clippy::too_many_arguments)]
    fn liquidation_call(
        &mut self,
        e: &Env,
        liquidator: &Address,
        collateral_asset: &Address,
        debt_asset: &Address,
        user: &Address,
        debt_to_cover: i128,
        receive_s_token: bool,
    ) -> (i128, i128);
}

/// Seizes collateral for repaid debt at the collateral reserve's liquidation bonus
pub struct CollateralManager {
    pool: Pool,
}

impl CollateralManager {
    pub fn load(e: &Env) -> Self {
        CollateralManager { pool: Pool::load(e) }
    }

    /// Calculate how much collateral can be seized for `debt_to_cover`, capped at the user's
    /// collateral balance
    ///
    /// Returns (collateral to seize, debt needed to seize it)
    fn calculate_available_collateral(
        &mut self,
        e: &Env,
        collateral_reserve: &Reserve,
        debt_reserve: &Reserve,
        debt_to_cover: i128,
        user_collateral_balance: i128,
    ) -> (i128, i128) {
        let collateral_price = self.pool.load_price(e, &collateral_reserve.asset);
        let debt_price = self.pool.load_price(e, &debt_reserve.asset);
        let liq_bonus = i128(collateral_reserve.config.liq_bonus);

        let debt_value = debt_reserve.to_base_down(e, debt_to_cover, debt_price);
        let max_collateral =
            collateral_reserve.from_base_down(e, percent_mul(e, debt_value, liq_bonus), collateral_price);
        if max_collateral <= user_collateral_balance {
            return (max_collateral, debt_to_cover);
        }

        let collateral_value =
            collateral_reserve.to_base_down(e, user_collateral_balance, collateral_price);
        let debt_needed =
            debt_reserve.from_base_down(e, percent_div(e, collateral_value, liq_bonus), debt_price);
        (user_collateral_balance, debt_needed)
    }
}

impl LiquidationManager for CollateralManager {
    fn liquidation_call(
        &mut self,
        e: &Env,
        liquidator: &Address,
        collateral_asset: &Address,
        debt_asset: &Address,
        user: &Address,
        debt_to_cover: i128,
        receive_s_token: bool,
    ) -> (i128, i128) {
        self.pool.require_not_paused(e);
        require_nonnegative(e, &debt_to_cover);

        let mut user_config = UserConfiguration::load(e, user);
        let account = calculate_user_account_data(e, &mut self.pool, user, &user_config);

        let collateral_reserve = self.pool.load_reserve(e, collateral_asset);
        let debt_reserve = self.pool.load_reserve(e, debt_asset);
        let user_debt = self.pool.load_debt_balance(e, &debt_reserve, user);
        validate_liquidation_call(
            e,
            &collateral_reserve,
            &debt_reserve,
            &user_config,
            account.health_factor,
            user_debt,
        );

        let user_collateral_balance =
            self.pool
                .load_supply_balance(e, &collateral_reserve, user);
        let max_liquidatable_debt = percent_mul(e, user_debt, i128(LIQUIDATION_CLOSE_FACTOR));
        let mut debt_repaid = debt_to_cover.min(max_liquidatable_debt);
        let (collateral_seized, debt_needed) = self.calculate_available_collateral(
            e,
            &collateral_reserve,
            &debt_reserve,
            debt_repaid,
            user_collateral_balance,
        );
        if debt_needed < debt_repaid {
            debt_repaid = debt_needed;
        }
        if debt_repaid <= 0 || collateral_seized <= 0 {
            panic_with_error!(e, PoolError::InvalidAmount);
        }
        if !receive_s_token && collateral_reserve.available_liquidity(e) < collateral_seized {
            panic_with_error!(e, PoolError::NotEnoughLiquidityToLiquidate);
        }

        // a collateral payout from the debt reserve leaves it in the same rate update
        let single_reserve = collateral_asset == debt_asset && !receive_s_token;

        // repay the debt
        let mut debt_reserve = debt_reserve;
        debt_reserve.update_state(e);
        DTokenClient::new(e, &debt_reserve.d_token).burn(
            user,
            &debt_repaid,
            &debt_reserve.borrow_index,
        );
        if single_reserve {
            debt_reserve.update_interest_rates(e, debt_repaid, collateral_seized);
        } else {
            debt_reserve.update_interest_rates(e, debt_repaid, 0);
        }
        let debt_s_token = debt_reserve.s_token.clone();
        let debt_index = debt_reserve.config.index;
        self.pool.cache_reserve(debt_reserve, true);

        // seize the collateral, reloading through the pool in case it is the debt reserve
        let mut collateral_reserve = self.pool.load_reserve(e, collateral_asset);
        let collateral_s_token = STokenClient::new(e, &collateral_reserve.s_token);
        if receive_s_token {
            if collateral_s_token.scaled_balance_of(liquidator) == 0 {
                let mut liquidator_config = UserConfiguration::load(e, liquidator);
                liquidator_config.set_collateral(collateral_reserve.config.index, true);
                liquidator_config.store(e, liquidator);
            }
            collateral_s_token.transfer_on_liquidation(
                user,
                liquidator,
                &collateral_seized,
                &collateral_reserve.normalized_income(e),
            );
        } else {
            if !single_reserve {
                collateral_reserve.update_state(e);
                collateral_reserve.update_interest_rates(e, 0, collateral_seized);
            }
            collateral_s_token.burn(
                user,
                liquidator,
                &collateral_seized,
                &collateral_reserve.liquidity_index,
            );
        }

        if collateral_seized == user_collateral_balance {
            user_config.set_collateral(collateral_reserve.config.index, false);
        }
        if debt_repaid == user_debt {
            user_config.set_borrowing(debt_index, false);
        }
        user_config.store(e, user);

        self.pool.cache_reserve(collateral_reserve, true);
        self.pool.store_cached_reserves(e);

        TokenClient::new(e, debt_asset).transfer(liquidator, &debt_s_token, &debt_repaid);
        STokenClient::new(e, &debt_s_token).handle_repayment(liquidator, &debt_repaid);

        (debt_repaid, collateral_seized)
    }
}

/// Liquidate part of an unhealthy loan through the pool's collateral manager
///
/// Returns (debt repaid, collateral seized)
#[allow(clippy::too_many_arguments)]
pub fn execute_liquidation_call(
    e: &Env,
    liquidator: &Address,
    collateral_asset: &Address,
    debt_asset: &Address,
    user: &Address,
    debt_to_cover: i128,
    receive_s_token: bool,
) -> (i128, i128) {
    let mut manager = CollateralManager::load(e);
    manager.liquidation_call(
        e,
        liquidator,
        collateral_asset,
        debt_asset,
        user,
        debt_to_cover,
        receive_s_token,
    )
}
