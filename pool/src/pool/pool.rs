use soroban_sdk::{map, panic_with_error, vec, Address, Env, Map, Vec};

use sep_40_oracle::{Asset, PriceFeedClient};

use crate::{
    constants::MAX_PRICE_AGE,
    dependencies::{DTokenClient, STokenClient},
    errors::PoolError,
    math::ray_mul,
    storage::{self, PoolConfig},
};

use super::reserve::Reserve;

pub struct Pool {
    pub config: PoolConfig,
    pub reserves: Map<Address, Reserve>,
    reserves_to_store: Vec<Address>,
    price_decimals: Option<u32>,
    prices: Map<Address, i128>,
    supply_balances: Map<(Address, Address), i128>,
}

impl Pool {
    /// Load the Pool from the ledger
    pub fn load(e: &Env) -> Self {
        let pool_config = storage::get_pool_config(e);
        Pool {
            config: pool_config,
            reserves: map![e],
            reserves_to_store: vec![e],
            price_decimals: None,
            prices: map![e],
            supply_balances: map![e],
        }
    }

    /// Require that the pool is not paused, or panic.
    pub fn require_not_paused(&self, e: &Env) {
        if self.config.paused {
            panic_with_error!(e, PoolError::Paused);
        }
    }

    /// Load a Reserve from the ledger. Returns a cached version if it exists.
    ///
    /// The reserve is not accrued, call `update_state` before mutating it.
    ///
    /// ### Arguments
    /// * asset - The address of the underlying asset
    pub fn load_reserve(&self, e: &Env, asset: &Address) -> Reserve {
        if let Some(reserve) = self.reserves.get(asset.clone()) {
            return reserve;
        }
        Reserve::load(e, asset)
    }

    /// Cache the updated reserve in the pool.
    ///
    /// ### Arguments
    /// * reserve - The updated reserve
    /// * write - If the reserve needs to be written to the ledger
    pub fn cache_reserve(&mut self, reserve: Reserve, write: bool) {
        if !self.reserves_to_store.contains(&reserve.asset) && write {
            self.reserves_to_store.push_back(reserve.asset.clone());
        }
        self.reserves.set(reserve.asset.clone(), reserve);
    }

    /// Store the cached reserves to the ledger that need to be written.
    pub fn store_cached_reserves(&self, e: &Env) {
        for address in self.reserves_to_store.iter() {
            let reserve = self.reserves.get_unchecked(address);
            reserve.store(e);
        }
    }

    /// Load the decimals of the prices for the Pool's oracle. Returns a cached version if one
    /// already exists.
    pub fn load_price_decimals(&mut self, e: &Env) -> u32 {
        if let Some(decimals) = self.price_decimals {
            return decimals;
        }
        let oracle_client = PriceFeedClient::new(e, &self.config.oracle);
        let decimals = oracle_client.decimals();
        self.price_decimals = Some(decimals);
        decimals
    }

    /// Load a price from the Pool's oracle. Returns a cached version if one already exists.
    ///
    /// ### Arguments
    /// * asset - The address of the underlying asset
    ///
    /// ### Panics
    /// If the price is missing, not positive, or stale
    pub fn load_price(&mut self, e: &Env, asset: &Address) -> i128 {
        if let Some(price) = self.prices.get(asset.clone()) {
            return price;
        }
        let oracle_client = PriceFeedClient::new(e, &self.config.oracle);
        let oracle_asset = Asset::Stellar(asset.clone());
        let price_data = match oracle_client.lastprice(&oracle_asset) {
            Some(price_data) => price_data,
            None => panic_with_error!(e, PoolError::InvalidPrice),
        };
        if price_data.price <= 0 {
            panic_with_error!(e, PoolError::InvalidPrice);
        }
        if price_data.timestamp + MAX_PRICE_AGE < e.ledger().timestamp() {
            panic_with_error!(e, PoolError::StalePrice);
        }
        self.prices.set(asset.clone(), price_data.price);
        price_data.price
    }

    /// Use a known supply balance for a user instead of reading it from the supply token.
    ///
    /// A supply token finalizing a transfer cannot be called back, so it reports the balance.
    ///
    /// ### Arguments
    /// * asset - The address of the underlying asset
    /// * user - The address of the user
    /// * balance - The user's balance in the underlying
    pub fn set_supply_balance(&mut self, asset: &Address, user: &Address, balance: i128) {
        self.supply_balances
            .set((asset.clone(), user.clone()), balance);
    }

    /// Load the supply balance of a user in the underlying as of the current ledger timestamp
    ///
    /// ### Arguments
    /// * reserve - The reserve
    /// * user - The address of the user
    pub fn load_supply_balance(&self, e: &Env, reserve: &Reserve, user: &Address) -> i128 {
        if let Some(balance) = self
            .supply_balances
            .get((reserve.asset.clone(), user.clone()))
        {
            return balance;
        }
        let scaled = STokenClient::new(e, &reserve.s_token).scaled_balance_of(user);
        ray_mul(e, scaled, reserve.normalized_income(e))
    }

    /// Load the debt of a user in the underlying as of the current ledger timestamp
    ///
    /// ### Arguments
    /// * reserve - The reserve
    /// * user - The address of the user
    pub fn load_debt_balance(&self, e: &Env, reserve: &Reserve, user: &Address) -> i128 {
        let scaled = DTokenClient::new(e, &reserve.d_token).scaled_balance_of(user);
        ray_mul(e, scaled, reserve.normalized_debt(e))
    }
}
