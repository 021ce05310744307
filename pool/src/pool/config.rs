use crate::{
    constants::{LEVERAGE_ONE, PERCENTAGE_FACTOR, RAY},
    dependencies::STokenClient,
    errors::PoolError,
    storage::{self, PoolConfig, ReserveConfig, ReserveData},
    validator::validate_collateral_config,
};
use cast::i128;
use soroban_sdk::{panic_with_error, Address, Env};

use super::reserve::Reserve;

/// Initialize the pool
///
/// Panics if the pool is already initialized or the arguments are invalid
#[allow(clippy::too_many_arguments)]
pub fn execute_initialize(
    e: &Env,
    admin: &Address,
    oracle: &Address,
    exchange: &Address,
    max_leverage: u32,
    pos_liq_threshold: i128,
    pos_liq_fee: u32,
) {
    if storage::has_admin(e) {
        panic_with_error!(e, PoolError::AlreadyInitializedError);
    }
    require_valid_leverage_params(e, max_leverage, pos_liq_threshold, pos_liq_fee);

    storage::set_admin(e, admin);
    storage::set_pool_config(
        e,
        &PoolConfig {
            oracle: oracle.clone(),
            exchange: exchange.clone(),
            max_leverage,
            pos_liq_threshold,
            pos_liq_fee,
            paused: false,
        },
    );
}

/// Update the leveraged position parameters. Open positions keep the liquidation threshold
/// they were opened with.
pub fn execute_set_leverage_params(
    e: &Env,
    max_leverage: u32,
    pos_liq_threshold: i128,
    pos_liq_fee: u32,
) {
    require_valid_leverage_params(e, max_leverage, pos_liq_threshold, pos_liq_fee);
    let mut pool_config = storage::get_pool_config(e);
    pool_config.max_leverage = max_leverage;
    pool_config.pos_liq_threshold = pos_liq_threshold;
    pool_config.pos_liq_fee = pos_liq_fee;
    storage::set_pool_config(e, &pool_config);
}

/// Set the exchange used to open and close positions
pub fn execute_set_exchange(e: &Env, exchange: &Address) {
    let mut pool_config = storage::get_pool_config(e);
    pool_config.exchange = exchange.clone();
    storage::set_pool_config(e, &pool_config);
}

/// Pause or unpause every state changing user action
pub fn execute_set_pause(e: &Env, paused: bool) {
    let mut pool_config = storage::get_pool_config(e);
    pool_config.paused = paused;
    storage::set_pool_config(e, &pool_config);
}

/// Initialize a reserve for the pool
///
/// Returns the index of the reserve
pub fn execute_init_reserve(
    e: &Env,
    asset: &Address,
    s_token: &Address,
    d_token: &Address,
    rate_strategy: &Address,
    config: &ReserveConfig,
) -> u32 {
    if storage::has_res(e, asset) {
        panic_with_error!(e, PoolError::ReserveAlreadyInitialized);
    }
    require_valid_reserve_config(e, config);
    validate_collateral_config(e, config.ltv, config.liq_threshold, config.liq_bonus, false);

    let index = storage::push_res_list(e, asset);
    let mut reserve_config = config.clone();
    reserve_config.index = index;
    storage::set_res_config(e, asset, &reserve_config);

    let init_data = ReserveData {
        liquidity_index: RAY,
        borrow_index: RAY,
        liquidity_rate: 0,
        borrow_rate: 0,
        last_time: e.ledger().timestamp(),
        s_token: s_token.clone(),
        d_token: d_token.clone(),
        rate_strategy: rate_strategy.clone(),
    };
    storage::set_res_data(e, asset, &init_data);
    index
}

/// Update the collateral parameters of a reserve
///
/// Panics if the parameters are invalid, or the reserve stops being collateral while it
/// holds supply
pub fn execute_configure_reserve_as_collateral(
    e: &Env,
    asset: &Address,
    ltv: u32,
    liq_threshold: u32,
    liq_bonus: u32,
) {
    let mut config = storage::get_res_config(e, asset);
    let data = storage::get_res_data(e, asset);
    let has_liquidity = data.liquidity_rate != 0
        || STokenClient::new(e, &data.s_token).scaled_total_supply() > 0;
    validate_collateral_config(e, ltv, liq_threshold, liq_bonus, has_liquidity);

    config.ltv = ltv;
    config.liq_threshold = liq_threshold;
    config.liq_bonus = liq_bonus;
    storage::set_res_config(e, asset, &config);
}

/// Update the status flags of a reserve
pub fn execute_set_reserve_status(
    e: &Env,
    asset: &Address,
    active: bool,
    frozen: bool,
    borrowing_enabled: bool,
) {
    let mut config = storage::get_res_config(e, asset);
    config.active = active;
    config.frozen = frozen;
    config.borrowing_enabled = borrowing_enabled;
    storage::set_res_config(e, asset, &config);
}

/// Update the reserve factor of a reserve. Interest is accrued at the old rates first.
pub fn execute_set_reserve_factor(e: &Env, asset: &Address, reserve_factor: u32) {
    if i128(reserve_factor) > PERCENTAGE_FACTOR {
        panic_with_error!(e, PoolError::InvalidReserveParams);
    }
    let mut reserve = Reserve::load(e, asset);
    reserve.update_state(e);
    reserve.config.reserve_factor = reserve_factor;
    reserve.update_interest_rates(e, 0, 0);
    reserve.store(e);
    storage::set_res_config(e, asset, &reserve.config);
}

/// Update the interest rate strategy of a reserve. Interest is accrued at the old rates first.
pub fn execute_set_rate_strategy(e: &Env, asset: &Address, rate_strategy: &Address) {
    let mut reserve = Reserve::load(e, asset);
    reserve.update_state(e);
    reserve.rate_strategy = rate_strategy.clone();
    reserve.update_interest_rates(e, 0, 0);
    reserve.store(e);
}

fn require_valid_reserve_config(e: &Env, config: &ReserveConfig) {
    if config.decimals > 18 || i128(config.reserve_factor) > PERCENTAGE_FACTOR {
        panic_with_error!(e, PoolError::InvalidReserveParams);
    }
}

fn require_valid_leverage_params(
    e: &Env,
    max_leverage: u32,
    pos_liq_threshold: i128,
    pos_liq_fee: u32,
) {
    if max_leverage <= LEVERAGE_ONE + 1
        || pos_liq_threshold <= 0
        || pos_liq_threshold > RAY
        || i128(pos_liq_fee) > PERCENTAGE_FACTOR
    {
        panic_with_error!(e, PoolError::InvalidPoolParams);
    }
}
