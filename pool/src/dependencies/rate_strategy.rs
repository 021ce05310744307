use soroban_sdk::{contractclient, Address, Env};

/// Computes the rates of a reserve from its liquidity and debt
#[allow(dead_code)]
#[contractclient(name = "RateStrategyClient")]
pub trait RateStrategy {
    /// Calculate the interest rates of a reserve
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    /// * `available_liquidity` - The underlying held by the reserve after the current action
    /// * `total_debt` - The total debt of the reserve
    /// * `reserve_factor` - The share of interest kept by the reserve, where 10000 is 100%
    ///
    /// ### Returns
    /// (liquidity rate, borrow rate) as annual rays
    fn calculate_interest_rates(
        e: Env,
        asset: Address,
        available_liquidity: i128,
        total_debt: i128,
        reserve_factor: u32,
    ) -> (i128, i128);
}
