use sep_41_token::TokenClient;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{
    contracttype, panic_with_error, Address, Env, Symbol,
};

use crate::{
    dependencies::{DTokenClient, RateStrategyClient},
    errors::PoolError,
    math::{compounded_interest, linear_interest, ray_mul, require_some},
    storage::{self, ReserveConfig, ReserveData},
};

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Reserve {
    pub asset: Address,         // the underlying asset address
    pub config: ReserveConfig,  // the risk and status configuration of the reserve
    pub liquidity_index: i128,  // the cumulative supply growth (ray)
    pub borrow_index: i128,     // the cumulative debt growth (ray)
    pub liquidity_rate: i128,   // the annual supply rate (ray)
    pub borrow_rate: i128,      // the annual borrow rate (ray)
    pub last_time: u64,         // the last time the indices were accrued
    pub s_token: Address,       // the supply token ledger
    pub d_token: Address,       // the debt token ledger
    pub rate_strategy: Address, // the interest rate strategy
    pub scalar: i128,           // scalar used for balances
}

impl Reserve {
    /// Load a Reserve from the ledger as it was last stored.
    ///
    /// **NOTE**: This function is not cached, and should be called from the Pool.
    ///
    /// ### Arguments
    /// * asset - The address of the underlying asset
    ///
    /// ### Panics
    /// If the asset is not a reserve
    pub fn load(e: &Env, asset: &Address) -> Reserve {
        let config = storage::get_res_config(e, asset);
        let data = storage::get_res_data(e, asset);
        Reserve {
            asset: asset.clone(),
            scalar: 10i128.pow(config.decimals),
            config,
            liquidity_index: data.liquidity_index,
            borrow_index: data.borrow_index,
            liquidity_rate: data.liquidity_rate,
            borrow_rate: data.borrow_rate,
            last_time: data.last_time,
            s_token: data.s_token,
            d_token: data.d_token,
            rate_strategy: data.rate_strategy,
        }
    }

    /// Store the updated reserve data to the ledger.
    ///
    /// The reserve configuration is only written by admin functions.
    pub fn store(&self, e: &Env) {
        let reserve_data = ReserveData {
            liquidity_index: self.liquidity_index,
            borrow_index: self.borrow_index,
            liquidity_rate: self.liquidity_rate,
            borrow_rate: self.borrow_rate,
            last_time: self.last_time,
            s_token: self.s_token.clone(),
            d_token: self.d_token.clone(),
            rate_strategy: self.rate_strategy.clone(),
        };
        storage::set_res_data(e, &self.asset, &reserve_data);
    }

    /********** Accrual **********/

    /// Accrue interest into the indices up to the current ledger timestamp. Does nothing
    /// if the reserve was already accrued this timestamp.
    ///
    /// The liquidity index grows linearly by the liquidity rate and the borrow index compounds
    /// every second by the borrow rate.
    ///
    /// ### Panics
    /// If either index overflows
    pub fn update_state(&mut self, e: &Env) {
        let now = e.ledger().timestamp();
        if now == self.last_time {
            return;
        }
        self.liquidity_index = self.normalized_income(e);
        self.borrow_index = self.normalized_debt(e);
        self.last_time = now;
    }

    /// Recompute the reserve rates through the rate strategy.
    ///
    /// Must be called after `update_state` in the same ledger, and before the underlying moves.
    ///
    /// ### Arguments
    /// * `liquidity_added` - The underlying about to be sent to the reserve
    /// * `liquidity_taken` - The underlying about to leave the reserve
    ///
    /// ### Panics
    /// If the reserve has not been accrued to the current timestamp
    pub fn update_interest_rates(&mut self, e: &Env, liquidity_added: i128, liquidity_taken: i128) {
        if self.last_time != e.ledger().timestamp() {
            panic_with_error!(e, PoolError::InternalError);
        }
        let available_liquidity = require_some(
            e,
            self.available_liquidity(e)
                .checked_add(liquidity_added)
                .and_then(|v| v.checked_sub(liquidity_taken)),
        );
        let total_debt = ray_mul(
            e,
            DTokenClient::new(e, &self.d_token).scaled_total_supply(),
            self.borrow_index,
        );
        let (liquidity_rate, borrow_rate) = RateStrategyClient::new(e, &self.rate_strategy)
            .calculate_interest_rates(
                &self.asset,
                &available_liquidity,
                &total_debt,
                &self.config.reserve_factor,
            );
        self.liquidity_rate = liquidity_rate;
        self.borrow_rate = borrow_rate;

        e.events().publish(
            (Symbol::new(e, "reserve_updated"), self.asset.clone()),
            (
                liquidity_rate,
                borrow_rate,
                self.liquidity_index,
                self.borrow_index,
            ),
        );
    }

    /// Fetch the liquidity index as of the current ledger timestamp, without accruing
    pub fn normalized_income(&self, e: &Env) -> i128 {
        if self.last_time == e.ledger().timestamp() || self.liquidity_rate == 0 {
            return self.liquidity_index;
        }
        let cumulated = linear_interest(e, self.liquidity_rate, self.last_time);
        ray_mul(e, cumulated, self.liquidity_index)
    }

    /// Fetch the borrow index as of the current ledger timestamp, without accruing
    pub fn normalized_debt(&self, e: &Env) -> i128 {
        if self.last_time == e.ledger().timestamp() || self.borrow_rate == 0 {
            return self.borrow_index;
        }
        let cumulated = compounded_interest(e, self.borrow_rate, self.last_time);
        ray_mul(e, cumulated, self.borrow_index)
    }

    /// Fetch the underlying held by the supply token ledger
    pub fn available_liquidity(&self, e: &Env) -> i128 {
        TokenClient::new(e, &self.asset).balance(&self.s_token)
    }

    /********** Conversion Functions **********/

    /// Convert an amount of the underlying to the oracle's base asset - rounding down
    ///
    /// ### Arguments
    /// * `amount` - The amount of tokens to convert
    /// * `price` - The price of the underlying in the base asset
    pub fn to_base_down(&self, e: &Env, amount: i128, price: i128) -> i128 {
        require_some(e, amount.fixed_mul_floor(price, self.scalar))
    }

    /// Convert an amount of the underlying to the oracle's base asset - rounding up
    ///
    /// ### Arguments
    /// * `amount` - The amount of tokens to convert
    /// * `price` - The price of the underlying in the base asset
    pub fn to_base_up(&self, e: &Env, amount: i128, price: i128) -> i128 {
        require_some(e, amount.fixed_mul_ceil(price, self.scalar))
    }

    /// Convert a base asset value to an amount of the underlying - rounding down
    ///
    /// ### Arguments
    /// * `value` - The value to convert
    /// * `price` - The price of the underlying in the base asset
    pub fn from_base_down(&self, e: &Env, value: i128, price: i128) -> i128 {
        require_some(e, value.fixed_div_floor(price, self.scalar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::RAY, testutils};
    use soroban_sdk::testutils::Address as _;

    #[test]
    fn test_load_and_store_reserve() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let pool = testutils::create_pool(&e);
        let asset = Address::generate(&e);
        let mut reserve = testutils::default_reserve(&e);
        reserve.asset = asset.clone();

        e.as_contract(&pool, || {
            storage::set_res_config(&e, &asset, &reserve.config);
            reserve.liquidity_index = 1_100_000_000_000_000_000_000_000_000;
            reserve.last_time = 1000;
            reserve.store(&e);

            let loaded = Reserve::load(&e, &asset);
            assert_eq!(loaded, reserve);
            assert_eq!(loaded.scalar, 1_0000000);
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1213)")]
    fn test_load_missing_reserve_panics() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);

        e.as_contract(&pool, || {
            Reserve::load(&e, &Address::generate(&e));
        });
    }

    #[test]
    fn test_update_state_same_timestamp_is_noop() {
        let e = Env::default();
        testutils::set_ledger(&e, 1000);

        let mut reserve = testutils::default_reserve(&e);
        reserve.liquidity_rate = RAY / 20;
        reserve.borrow_rate = RAY / 10;
        reserve.last_time = 1000;

        let before = reserve.clone();
        reserve.update_state(&e);
        assert_eq!(reserve, before);
    }

    #[test]
    fn test_update_state_accrues_one_year() {
        let e = Env::default();
        testutils::set_ledger(&e, 31536000);

        let mut reserve = testutils::default_reserve(&e);
        reserve.liquidity_rate = RAY / 20;
        reserve.borrow_rate = RAY / 10;
        reserve.last_time = 0;

        reserve.update_state(&e);
        assert_eq!(reserve.liquidity_index, RAY + RAY / 20);
        assert!(reserve.borrow_index > RAY + RAY / 10);
        assert!(reserve.borrow_index < 1_105_170_000_000_000_000_000_000_000);
        assert_eq!(reserve.last_time, 31536000);

        // a second update in the same ledger does not accrue again
        let accrued = reserve.clone();
        reserve.update_state(&e);
        assert_eq!(reserve, accrued);
    }

    #[test]
    fn test_update_state_zero_rates_keeps_indices() {
        let e = Env::default();
        testutils::set_ledger(&e, 5000);

        let mut reserve = testutils::default_reserve(&e);
        reserve.liquidity_index = 1_050_000_000_000_000_000_000_000_000;
        reserve.borrow_index = 1_070_000_000_000_000_000_000_000_000;
        reserve.last_time = 100;

        reserve.update_state(&e);
        assert_eq!(reserve.liquidity_index, 1_050_000_000_000_000_000_000_000_000);
        assert_eq!(reserve.borrow_index, 1_070_000_000_000_000_000_000_000_000);
        assert_eq!(reserve.last_time, 5000);
    }

    #[test]
    fn test_normalized_matches_accrued_indices() {
        let e = Env::default();
        testutils::set_ledger(&e, 86400 * 17);

        let mut reserve = testutils::default_reserve(&e);
        reserve.liquidity_index = 1_012_345_678_901_234_567_890_123_456;
        reserve.borrow_index = 1_023_456_789_012_345_678_901_234_567;
        reserve.liquidity_rate = 0_031_234_567_890_123_456_789_012_345;
        reserve.borrow_rate = 0_087_654_321_098_765_432_109_876_543;
        reserve.last_time = 86400 * 3;

        let income = reserve.normalized_income(&e);
        let debt = reserve.normalized_debt(&e);
        assert!(income > reserve.liquidity_index);
        assert!(debt > reserve.borrow_index);

        reserve.update_state(&e);
        assert_eq!(reserve.liquidity_index, income);
        assert_eq!(reserve.borrow_index, debt);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #12)")]
    fn test_update_state_index_overflow() {
        let e = Env::default();
        testutils::set_ledger(&e, 31536000);

        let mut reserve = testutils::default_reserve(&e);
        reserve.liquidity_index = i128::MAX / 2;
        reserve.liquidity_rate = 2 * RAY;
        reserve.last_time = 0;

        reserve.update_state(&e);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1)")]
    fn test_update_interest_rates_requires_accrual() {
        let e = Env::default();
        testutils::set_ledger(&e, 1000);

        let mut reserve = testutils::default_reserve(&e);
        reserve.last_time = 999;

        reserve.update_interest_rates(&e, 0, 0);
    }

    #[test]
    fn test_update_interest_rates() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 1);
        let asset = fixture.assets[0].clone();
        let s_token = fixture.s_token(0);

        // 750 borrowed out of 1000 supplied
        fixture.tokens[0].mint(&s_token.address, &250_0000000);
        e.as_contract(&fixture.pool, || {
            let mut reserve = Reserve::load(&e, &asset);
            fixture.d_token(0).mint(&fixture.admin, &750_0000000, &reserve.borrow_index);

            reserve.update_state(&e);
            reserve.update_interest_rates(&e, 0, 0);
            // base 0% + slope_1 4% * 75% / 80%
            assert_eq!(reserve.borrow_rate, 0_037_500_000_000_000_000_000_000_000);
            // borrow rate * 75% utilization * 90% after the reserve factor
            assert_eq!(reserve.liquidity_rate, 0_025_312_500_000_000_000_000_000_000);
        });
    }

    #[test]
    fn test_base_conversions() {
        let e = Env::default();
        let mut reserve = testutils::default_reserve(&e);
        reserve.scalar = 1_000000;

        // 1.5 units at a price of 2.0000001
        assert_eq!(reserve.to_base_down(&e, 1_500000, 2_0000001), 3_0000001);
        assert_eq!(reserve.to_base_up(&e, 1_500000, 2_0000001), 3_0000002);
        assert_eq!(reserve.from_base_down(&e, 3_0000001, 2_0000001), 1_499999);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #12)")]
    fn test_to_base_overflow() {
        let e = Env::default();
        let reserve = testutils::default_reserve(&e);

        reserve.to_base_down(&e, i128::MAX / 2, 1_000_0000000);
    }
}
