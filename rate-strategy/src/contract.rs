use cast::i128;
use soroban_sdk::{contract, contractclient, contractimpl, panic_with_error, Address, Env, Symbol};

use crate::{
    constants::{PERCENTAGE_FACTOR, RAY},
    errors::StrategyError,
    math::{percent_mul, ray_div, ray_mul},
    storage::{self, InterestRateParams},
};

/// ### RateStrategy
///
/// Computes reserve interest rates from utilization with a two slope curve.
#[contract]
pub struct RateStrategyContract;

#[contractclient(name = "RateStrategyClient")]
pub trait RateStrategy {
    /// Initialize the rate strategy
    ///
    /// ### Arguments
    /// * `admin` - The Address for the admin
    /// * `params` - The rate curve parameters
    ///
    /// ### Panics
    /// If the strategy is already initialized or the parameters are invalid
    fn initialize(e: Env, admin: Address, params: InterestRateParams);

    /// (Admin only) Update the rate curve parameters
    ///
    /// ### Panics
    /// If the caller is not the admin or the parameters are invalid
    fn set_params(e: Env, params: InterestRateParams);

    /// Fetch the rate curve parameters
    fn get_params(e: Env) -> InterestRateParams;

    /// Calculate the rates of a reserve
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    /// * `available_liquidity` - The underlying the reserve can lend
    /// * `total_debt` - The underlying currently borrowed from the reserve
    /// * `reserve_factor` - The share of interest kept by the reserve, where 10000 is 100%
    ///
    /// Returns (liquidity rate, borrow rate) as rays
    fn calculate_interest_rates(
        e: Env,
        asset: Address,
        available_liquidity: i128,
        total_debt: i128,
        reserve_factor: u32,
    ) -> (i128, i128);
}

#[contractimpl]
impl RateStrategy for RateStrategyContract {
    fn initialize(e: Env, admin: Address, params: InterestRateParams) {
        storage::extend_instance(&e);
        if storage::has_admin(&e) {
            panic_with_error!(&e, StrategyError::AlreadyInitializedError);
        }
        require_valid_params(&e, &params);

        storage::set_admin(&e, &admin);
        storage::set_params(&e, &params);
    }

    fn set_params(e: Env, params: InterestRateParams) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();
        require_valid_params(&e, &params);

        storage::set_params(&e, &params);

        e.events()
            .publish((Symbol::new(&e, "set_params"), admin), params);
    }

    fn get_params(e: Env) -> InterestRateParams {
        storage::get_params(&e)
    }

    fn calculate_interest_rates(
        e: Env,
        _asset: Address,
        available_liquidity: i128,
        total_debt: i128,
        reserve_factor: u32,
    ) -> (i128, i128) {
        if available_liquidity < 0 || total_debt < 0 {
            panic_with_error!(&e, StrategyError::NegativeAmountError);
        }
        let reserve_factor = i128(reserve_factor);
        if reserve_factor > PERCENTAGE_FACTOR {
            panic_with_error!(&e, StrategyError::InvalidReserveFactor);
        }
        let params = storage::get_params(&e);

        let utilization = match available_liquidity.checked_add(total_debt) {
            Some(0) => 0,
            Some(total) => ray_div(&e, total_debt, total),
            None => panic_with_error!(&e, StrategyError::ArithmeticOverflow),
        };

        let borrow_rate = if utilization > params.optimal_utilization {
            let excess = ray_div(
                &e,
                utilization - params.optimal_utilization,
                RAY - params.optimal_utilization,
            );
            params.base_rate + params.slope_1 + ray_mul(&e, params.slope_2, excess)
        } else {
            let scaled = ray_div(&e, utilization, params.optimal_utilization);
            params.base_rate + ray_mul(&e, params.slope_1, scaled)
        };

        let liquidity_rate = percent_mul(
            &e,
            ray_mul(&e, borrow_rate, utilization),
            PERCENTAGE_FACTOR - reserve_factor,
        );
        (liquidity_rate, borrow_rate)
    }
}

fn require_valid_params(e: &Env, params: &InterestRateParams) {
    if params.optimal_utilization <= 0
        || params.optimal_utilization >= RAY
        || params.base_rate < 0
        || params.slope_1 < 0
        || params.slope_2 < 0
    {
        panic_with_error!(e, StrategyError::InvalidRateParams);
    }
}
