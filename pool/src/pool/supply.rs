use sep_41_token::TokenClient;
use soroban_sdk::{Address, Env};

use crate::{dependencies::STokenClient, validator::validate_deposit};

use super::{pool::Pool, user_config::UserConfiguration};

/// Deposit `amount` of `asset` from `from` and credit the supply to `on_behalf_of`
///
/// The first deposit of a reserve enables it as collateral for `on_behalf_of`.
pub fn execute_deposit(
    e: &Env,
    from: &Address,
    asset: &Address,
    amount: i128,
    on_behalf_of: &Address,
) {
    let mut pool = Pool::load(e);
    pool.require_not_paused(e);

    let mut reserve = pool.load_reserve(e, asset);
    validate_deposit(e, &reserve, amount);

    reserve.update_state(e);
    reserve.update_interest_rates(e, amount, 0);

    TokenClient::new(e, asset).transfer(from, &reserve.s_token, &amount);
    let is_first =
        STokenClient::new(e, &reserve.s_token).mint(on_behalf_of, &amount, &reserve.liquidity_index);
    if is_first {
        let mut user_config = UserConfiguration::load(e, on_behalf_of);
        user_config.set_collateral(reserve.config.index, true);
        user_config.store(e, on_behalf_of);
    }

    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
}
