use soroban_sdk::{Address, Env};

use crate::{dependencies::STokenClient, validator::validate_withdraw};

use super::{pool::Pool, user_config::UserConfiguration};

/// Withdraw `amount` of `asset` supplied by `from` and send the underlying to `to`. An amount
/// of i128::MAX withdraws the full balance.
///
/// Returns the amount withdrawn
pub fn execute_withdraw(
    e: &Env,
    from: &Address,
    asset: &Address,
    amount: i128,
    to: &Address,
) -> i128 {
    let mut pool = Pool::load(e);
    pool.require_not_paused(e);

    let mut reserve = pool.load_reserve(e, asset);
    let user_balance = pool.load_supply_balance(e, &reserve, from);
    let amount_to_withdraw = if amount == i128::MAX {
        user_balance
    } else {
        amount
    };

    let mut user_config = UserConfiguration::load(e, from);
    validate_withdraw(
        e,
        &mut pool,
        &reserve,
        from,
        amount_to_withdraw,
        user_balance,
        &user_config,
    );

    reserve.update_state(e);
    reserve.update_interest_rates(e, 0, amount_to_withdraw);

    if amount_to_withdraw == user_balance {
        user_config.set_collateral(reserve.config.index, false);
        user_config.store(e, from);
    }

    STokenClient::new(e, &reserve.s_token).burn(
        from,
        to,
        &amount_to_withdraw,
        &reserve.liquidity_index,
    );

    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
    amount_to_withdraw
}
