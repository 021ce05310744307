use cast::i128;
use sep_41_token::TokenClient;
use soroban_sdk::{panic_with_error, Address, Env};

use crate::{
    dependencies::{DTokenClient, ExchangeClient, STokenClient, SwapRoute},
    errors::PoolError,
    math::{percent_mul, ray_mul},
    storage::{self, Position},
    validator::{
        require_nonnegative, validate_close_position, validate_liquidate_position,
        validate_open_position,
    },
};

use super::{health_factor::calculate_position_health_factor, pool::Pool};

/// Open a leveraged position for `trader`
///
/// The margin is held by the pool, and `margin value * leverage` of the borrowed asset is
/// borrowed by the pool and swapped into the held asset through `swap`.
///
/// ### Arguments
/// * `leverage` - The leverage of the position, where 10000 is 1x
/// * `swap` - The route converting the borrowed asset into the held asset
///
/// Returns the opened position
#[allow(clippy::too_many_arguments)]
pub fn execute_open_position(
    e: &Env,
    trader: &Address,
    margin_asset: &Address,
    borrowed_asset: &Address,
    held_asset: &Address,
    margin_amount: i128,
    leverage: u32,
    swap: &SwapRoute,
) -> Position {
    let mut pool = Pool::load(e);
    pool.require_not_paused(e);

    let margin_reserve = pool.load_reserve(e, margin_asset);
    let mut borrowed_reserve = pool.load_reserve(e, borrowed_asset);
    let held_reserve = pool.load_reserve(e, held_asset);

    let margin_price = pool.load_price(e, margin_asset);
    let borrowed_price = pool.load_price(e, borrowed_asset);
    let margin_value = margin_reserve.to_base_down(e, margin_amount, margin_price);
    let borrow_value = percent_mul(e, margin_value, i128(leverage));
    let borrow_amount = borrowed_reserve.from_base_down(e, borrow_value, borrowed_price);
    validate_open_position(
        e,
        &margin_reserve,
        &borrowed_reserve,
        &held_reserve,
        margin_amount,
        borrow_amount,
        leverage,
        pool.config.max_leverage,
    );

    let pool_address = e.current_contract_address();
    TokenClient::new(e, margin_asset).transfer(trader, &pool_address, &margin_amount);

    borrowed_reserve.update_state(e);
    let d_token = DTokenClient::new(e, &borrowed_reserve.d_token);
    let scaled_before = d_token.scaled_balance_of(&pool_address);
    d_token.mint(&pool_address, &borrow_amount, &borrowed_reserve.borrow_index);
    let scaled_debt = d_token.scaled_balance_of(&pool_address) - scaled_before;
    borrowed_reserve.update_interest_rates(e, 0, borrow_amount);
    STokenClient::new(e, &borrowed_reserve.s_token)
        .transfer_underlying_to(&pool_address, &borrow_amount);
    pool.cache_reserve(borrowed_reserve, true);
    pool.store_cached_reserves(e);

    let held_amount = execute_swap(
        e,
        &pool.config.exchange,
        swap,
        borrowed_asset,
        held_asset,
        borrow_amount,
    );

    let position = Position {
        id: storage::next_position_id(e),
        trader: trader.clone(),
        margin_asset: margin_asset.clone(),
        borrowed_asset: borrowed_asset.clone(),
        held_asset: held_asset.clone(),
        margin_amount,
        borrowed_amount: borrow_amount,
        held_amount,
        scaled_debt,
        liq_threshold: pool.config.pos_liq_threshold,
        opened_at: e.ledger().timestamp(),
        is_open: true,
    };
    storage::set_position(e, &position);
    storage::push_trader_position(e, trader, position.id);
    position
}

/// Close a position owned by `caller` and pay what is left after the debt to the trader
///
/// ### Arguments
/// * `held_swap` - The route converting the held asset into the borrowed asset
/// * `margin_swap` - The route converting the margin into the borrowed asset, not used when
///                   the margin is the borrowed asset
///
/// Returns the amount of the borrowed asset paid to the trader
pub fn execute_close_position(
    e: &Env,
    caller: &Address,
    id: u64,
    held_swap: &SwapRoute,
    margin_swap: &Option<SwapRoute>,
) -> i128 {
    let mut pool = Pool::load(e);
    pool.require_not_paused(e);

    let mut position = load_position(e, id);
    validate_close_position(e, &position, caller);

    let (payment, _) =
        settle_position(e, &mut pool, &mut position, held_swap, margin_swap, false);
    if payment > 0 {
        TokenClient::new(e, &position.borrowed_asset).transfer(
            &e.current_contract_address(),
            &position.trader,
            &payment,
        );
    }
    payment
}

/// Liquidate an unhealthy position. The liquidator receives the pool's position liquidation
/// fee from the amount left after the debt, and the trader receives the rest.
///
/// If the proceeds do not cover the debt, all of them repay the debt and the rest remains as
/// debt of the pool's own account. Nothing is paid out.
///
/// Returns (liquidator share, trader share, shortfall) in the borrowed asset
pub fn execute_liquidate_position(
    e: &Env,
    liquidator: &Address,
    id: u64,
    held_swap: &SwapRoute,
    margin_swap: &Option<SwapRoute>,
) -> (i128, i128, i128) {
    let mut pool = Pool::load(e);
    pool.require_not_paused(e);

    let mut position = load_position(e, id);
    let health_factor = calculate_position_health_factor(e, &mut pool, &position);
    validate_liquidate_position(e, &position, health_factor);

    let (payment, shortfall) =
        settle_position(e, &mut pool, &mut position, held_swap, margin_swap, true);
    let liquidator_share = percent_mul(e, payment, i128(pool.config.pos_liq_fee));
    let trader_share = payment - liquidator_share;

    let pool_address = e.current_contract_address();
    let token = TokenClient::new(e, &position.borrowed_asset);
    if liquidator_share > 0 {
        token.transfer(&pool_address, liquidator, &liquidator_share);
    }
    if trader_share > 0 {
        token.transfer(&pool_address, &position.trader, &trader_share);
    }
    (liquidator_share, trader_share, shortfall)
}

/// Load a position
///
/// ### Panics
/// If the position does not exist
pub fn load_position(e: &Env, id: u64) -> Position {
    match storage::get_position(e, id) {
        Some(position) => position,
        None => panic_with_error!(e, PoolError::PositionNotFound),
    }
}

/// Convert the position back into the borrowed asset, repay its debt and mark it closed
///
/// ### Arguments
/// * `allow_shortfall` - If proceeds below the debt repay what they can instead of panicking
///
/// Returns (proceeds left after the debt, debt left unpaid)
fn settle_position(
    e: &Env,
    pool: &mut Pool,
    position: &mut Position,
    held_swap: &SwapRoute,
    margin_swap: &Option<SwapRoute>,
    allow_shortfall: bool,
) -> (i128, i128) {
    let exchange = pool.config.exchange.clone();
    let mut proceeds = execute_swap(
        e,
        &exchange,
        held_swap,
        &position.held_asset,
        &position.borrowed_asset,
        position.held_amount,
    );
    let margin_proceeds = if position.margin_asset == position.borrowed_asset {
        position.margin_amount
    } else {
        match margin_swap {
            Some(route) => execute_swap(
                e,
                &exchange,
                route,
                &position.margin_asset,
                &position.borrowed_asset,
                position.margin_amount,
            ),
            None => panic_with_error!(e, PoolError::InvalidSwap),
        }
    };
    proceeds += margin_proceeds;

    let mut borrowed_reserve = pool.load_reserve(e, &position.borrowed_asset);
    borrowed_reserve.update_state(e);
    let owed = ray_mul(e, position.scaled_debt, borrowed_reserve.borrow_index);
    if proceeds < owed && !allow_shortfall {
        panic_with_error!(e, PoolError::InsufficientProceeds);
    }
    let repaid = proceeds.min(owed);

    let pool_address = e.current_contract_address();
    if repaid > 0 {
        DTokenClient::new(e, &borrowed_reserve.d_token).burn(
            &pool_address,
            &repaid,
            &borrowed_reserve.borrow_index,
        );
    }
    borrowed_reserve.update_interest_rates(e, repaid, 0);
    if repaid > 0 {
        TokenClient::new(e, &position.borrowed_asset).transfer(
            &pool_address,
            &borrowed_reserve.s_token,
            &repaid,
        );
        STokenClient::new(e, &borrowed_reserve.s_token).handle_repayment(&pool_address, &repaid);
    }
    pool.cache_reserve(borrowed_reserve, true);
    pool.store_cached_reserves(e);

    position.is_open = false;
    storage::set_position(e, position);
    (proceeds - repaid, owed - repaid)
}

/// Swap `amount` of `src_token` held by the pool into `dst_token` through the exchange
///
/// The route's amount and destination receiver are pinned to `amount` and the pool.
///
/// Returns the amount of `dst_token` the pool received
fn execute_swap(
    e: &Env,
    exchange: &Address,
    route: &SwapRoute,
    src_token: &Address,
    dst_token: &Address,
    amount: i128,
) -> i128 {
    if route.desc.src_token != *src_token || route.desc.dst_token != *dst_token {
        panic_with_error!(e, PoolError::InvalidSwap);
    }
    require_nonnegative(e, &route.desc.min_return_amount);

    let pool_address = e.current_contract_address();
    let mut desc = route.desc.clone();
    desc.amount = amount;
    desc.dst_receiver = pool_address.clone();

    let dst_client = TokenClient::new(e, dst_token);
    let balance_before = dst_client.balance(&pool_address);
    TokenClient::new(e, src_token).transfer(&pool_address, &desc.src_receiver, &amount);
    ExchangeClient::new(e, exchange).swap(&route.executor, &desc, &route.data);
    let received = dst_client.balance(&pool_address) - balance_before;

    if received < desc.min_return_amount {
        panic_with_error!(e, PoolError::SlippageExceeded);
    }
    received
}
