use crate::{
    dependencies::SwapRoute,
    pool::{self, AccountData, Pool as PoolState, Reserve, UserConfiguration},
    storage::{self, PoolConfig, Position, ReserveConfig},
};
use soroban_sdk::{contract, contractclient, contractimpl, Address, Env, Symbol, Vec};

/// ### Pool
///
/// A collateralized lending pool with leveraged positions.
#[contract]
pub struct PoolContract;

#[contractclient(name = "PoolClient")]
pub trait Pool {
    /// Initialize the pool
    ///
    /// ### Arguments
    /// * `admin` - The Address for the admin
    /// * `oracle` - The contract address of the SEP-40 price oracle
    /// * `exchange` - The contract address of the exchange used by positions
    /// * `max_leverage` - The exclusive leverage cap for positions, where 10000 is 1x
    /// * `pos_liq_threshold` - The liquidation threshold given to new positions (ray)
    /// * `pos_liq_fee` - The share of a liquidated position's residual paid to the liquidator
    ///
    /// ### Panics
    /// If the pool is already initialized or a parameter is invalid
    #[allow(clippy::too_many_arguments)]
    fn initialize(
        e: Env,
        admin: Address,
        oracle: Address,
        exchange: Address,
        max_leverage: u32,
        pos_liq_threshold: i128,
        pos_liq_fee: u32,
    );

    /// (Admin only) Set a new address as the admin of this pool
    ///
    /// ### Arguments
    /// * `new_admin` - The new admin address
    ///
    /// ### Panics
    /// If the caller is not the admin
    fn set_admin(e: Env, new_admin: Address);

    /// (Admin only) Initialize a reserve in the pool
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset to add as a reserve
    /// * `s_token` - The supply token ledger of the reserve
    /// * `d_token` - The debt token ledger of the reserve
    /// * `rate_strategy` - The interest rate strategy of the reserve
    /// * `config` - The ReserveConfig for the reserve
    ///
    /// ### Panics
    /// If the caller is not the admin, the reserve is already setup, or the config is invalid
    fn init_reserve(
        e: Env,
        asset: Address,
        s_token: Address,
        d_token: Address,
        rate_strategy: Address,
        config: ReserveConfig,
    ) -> u32;

    /// (Admin only) Update the collateral parameters of a reserve
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    /// * `ltv` - The loan to value, where 10000 is 100%
    /// * `liq_threshold` - The liquidation threshold, where 10000 is 100%
    /// * `liq_bonus` - The liquidation bonus, where 10500 is a 5% bonus
    fn configure_reserve_as_collateral(
        e: Env,
        asset: Address,
        ltv: u32,
        liq_threshold: u32,
        liq_bonus: u32,
    );

    /// (Admin only) Update the status flags of a reserve
    fn set_reserve_status(
        e: Env,
        asset: Address,
        active: bool,
        frozen: bool,
        borrowing_enabled: bool,
    );

    /// (Admin only) Update the reserve factor of a reserve
    fn set_reserve_factor(e: Env, asset: Address, reserve_factor: u32);

    /// (Admin only) Update the interest rate strategy of a reserve
    fn set_rate_strategy(e: Env, asset: Address, rate_strategy: Address);

    /// (Admin only) Pause or unpause the pool
    fn set_pause(e: Env, paused: bool);

    /// (Admin only) Update the parameters given to new positions
    fn set_leverage_params(e: Env, max_leverage: u32, pos_liq_threshold: i128, pos_liq_fee: u32);

    /// (Admin only) Update the exchange used by positions
    fn set_exchange(e: Env, exchange: Address);

    /********* Lending **********/

    /// Deposit `amount` of `asset` from `from` on behalf of `on_behalf_of`
    ///
    /// ### Panics
    /// If the reserve is inactive or frozen, or the amount is not positive
    fn deposit(e: Env, from: Address, asset: Address, amount: i128, on_behalf_of: Address);

    /// Withdraw `amount` of `asset` supplied by `from` to `to`. Use i128::MAX to withdraw
    /// everything.
    ///
    /// Returns the amount withdrawn
    ///
    /// ### Panics
    /// If the balance is insufficient, or the withdrawal drops `from` below the
    /// liquidation boundary
    fn withdraw(e: Env, from: Address, asset: Address, amount: i128, to: Address) -> i128;

    /// Borrow `amount` of `asset` against the collateral of `from`
    ///
    /// ### Arguments
    /// * `rate_mode` - The interest rate mode, only variable (2) is supported
    ///
    /// ### Panics
    /// If the collateral of `from` does not cover the debt
    fn borrow(e: Env, from: Address, asset: Address, amount: i128, rate_mode: u32);

    /// Repay `amount` of the `asset` debt of `on_behalf_of` with funds from `from`. Use
    /// i128::MAX to repay everything.
    ///
    /// Returns the amount repaid
    fn repay(
        e: Env,
        from: Address,
        asset: Address,
        amount: i128,
        rate_mode: u32,
        on_behalf_of: Address,
    ) -> i128;

    /// Enable or disable the supply of `asset` as collateral for `from`
    ///
    /// ### Panics
    /// If `from` has no supply, or disabling drops `from` below the liquidation boundary
    fn set_use_as_collateral(e: Env, from: Address, asset: Address, use_as_collateral: bool);

    /// (Supply token only) Validate and account for a transfer of supply tokens
    ///
    /// ### Arguments
    /// * `amount` - The amount of the underlying transferred
    /// * `from_before` - The underlying balance of `from` before the transfer
    /// * `to_before` - The underlying balance of `to` before the transfer
    fn finalize_transfer(
        e: Env,
        asset: Address,
        from: Address,
        to: Address,
        amount: i128,
        from_before: i128,
        to_before: i128,
    );

    /// Liquidate an unhealthy loan
    ///
    /// ### Arguments
    /// * `liquidator` - The address repaying the debt
    /// * `collateral_asset` - The collateral to seize
    /// * `debt_asset` - The debt to repay
    /// * `user` - The borrower being liquidated
    /// * `debt_to_cover` - The maximum amount of debt to repay
    /// * `receive_s_token` - If the collateral is received as supply instead of the underlying
    ///
    /// Returns (debt repaid, collateral seized)
    #[allow(clippy::too_many_arguments)]
    fn liquidation_call(
        e: Env,
        liquidator: Address,
        collateral_asset: Address,
        debt_asset: Address,
        user: Address,
        debt_to_cover: i128,
        receive_s_token: bool,
    ) -> (i128, i128);

    /********* Positions **********/

    /// Open a leveraged position
    ///
    /// ### Arguments
    /// * `trader` - The owner of the position, who supplies the margin
    /// * `margin_asset` - The asset of the margin
    /// * `borrowed_asset` - The asset borrowed by the position
    /// * `held_asset` - The asset the borrowed funds are swapped into
    /// * `margin_amount` - The amount of margin
    /// * `leverage` - The leverage, where 10000 is 1x
    /// * `swap` - The route from the borrowed asset to the held asset
    ///
    /// Returns the id of the position
    #[allow(clippy::too_many_arguments)]
    fn open_position(
        e: Env,
        trader: Address,
        margin_asset: Address,
        borrowed_asset: Address,
        held_asset: Address,
        margin_amount: i128,
        leverage: u32,
        swap: SwapRoute,
    ) -> u64;

    /// Close a position owned by `caller`
    ///
    /// ### Arguments
    /// * `held_swap` - The route from the held asset to the borrowed asset
    /// * `margin_swap` - The route from the margin asset to the borrowed asset, if they differ
    ///
    /// Returns the amount of the borrowed asset paid to the trader
    fn close_position(
        e: Env,
        caller: Address,
        id: u64,
        held_swap: SwapRoute,
        margin_swap: Option<SwapRoute>,
    ) -> i128;

    /// Liquidate a position whose health factor is below 1
    ///
    /// When the proceeds do not cover the debt they are all used to repay it, nothing is paid
    /// out, and the unpaid debt stays with the pool as bad debt.
    ///
    /// Returns (liquidator share, trader share) of the borrowed asset left after the debt
    fn liquidate_position(
        e: Env,
        liquidator: Address,
        id: u64,
        held_swap: SwapRoute,
        margin_swap: Option<SwapRoute>,
    ) -> (i128, i128);

    /********* Queries **********/

    /// Fetch the pool configuration
    fn get_pool_config(e: Env) -> PoolConfig;

    /// Fetch a reserve as it was last stored
    fn get_reserve(e: Env, asset: Address) -> Reserve;

    /// Fetch the underlying assets of every reserve, ordered by reserve index
    fn get_reserve_list(e: Env) -> Vec<Address>;

    /// Fetch the liquidity index of a reserve as of now
    fn get_normalized_income(e: Env, asset: Address) -> i128;

    /// Fetch the borrow index of a reserve as of now
    fn get_normalized_debt(e: Env, asset: Address) -> i128;

    /// Fetch the account summary of a user
    fn get_user_account_data(e: Env, user: Address) -> AccountData;

    /// Fetch the packed collateral and borrowing flags of a user
    fn get_user_configuration(e: Env, user: Address) -> u128;

    /// Fetch a position
    ///
    /// ### Panics
    /// If the position does not exist
    fn get_position(e: Env, id: u64) -> Position;

    /// Fetch the ids of every position opened by `trader`
    fn get_trader_positions(e: Env, trader: Address) -> Vec<u64>;

    /// Fetch the health factor of a position
    fn get_position_health_factor(e: Env, id: u64) -> i128;

    /// Fetch the profit and loss of a position in the oracle's base asset
    fn get_pnl(e: Env, id: u64) -> i128;
}

#[contractimpl]
impl Pool for PoolContract {
    fn initialize(
        e: Env,
        admin: Address,
        oracle: Address,
        exchange: Address,
        max_leverage: u32,
        pos_liq_threshold: i128,
        pos_liq_fee: u32,
    ) {
        storage::extend_instance(&e);
        admin.require_auth();

        pool::execute_initialize(
            &e,
            &admin,
            &oracle,
            &exchange,
            max_leverage,
            pos_liq_threshold,
            pos_liq_fee,
        );
    }

    fn set_admin(e: Env, new_admin: Address) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();
        new_admin.require_auth();

        storage::set_admin(&e, &new_admin);

        e.events()
            .publish((Symbol::new(&e, "set_admin"), admin), new_admin);
    }

    fn init_reserve(
        e: Env,
        asset: Address,
        s_token: Address,
        d_token: Address,
        rate_strategy: Address,
        config: ReserveConfig,
    ) -> u32 {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        let index =
            pool::execute_init_reserve(&e, &asset, &s_token, &d_token, &rate_strategy, &config);

        e.events()
            .publish((Symbol::new(&e, "init_reserve"), admin), (asset, index));
        index
    }

    fn configure_reserve_as_collateral(
        e: Env,
        asset: Address,
        ltv: u32,
        liq_threshold: u32,
        liq_bonus: u32,
    ) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_configure_reserve_as_collateral(&e, &asset, ltv, liq_threshold, liq_bonus);

        e.events().publish(
            (Symbol::new(&e, "configure_collateral"), admin),
            (asset, ltv, liq_threshold, liq_bonus),
        );
    }

    fn set_reserve_status(
        e: Env,
        asset: Address,
        active: bool,
        frozen: bool,
        borrowing_enabled: bool,
    ) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_set_reserve_status(&e, &asset, active, frozen, borrowing_enabled);

        e.events().publish(
            (Symbol::new(&e, "set_reserve_status"), admin),
            (asset, active, frozen, borrowing_enabled),
        );
    }

    fn set_reserve_factor(e: Env, asset: Address, reserve_factor: u32) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_set_reserve_factor(&e, &asset, reserve_factor);

        e.events().publish(
            (Symbol::new(&e, "set_reserve_factor"), admin),
            (asset, reserve_factor),
        );
    }

    fn set_rate_strategy(e: Env, asset: Address, rate_strategy: Address) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_set_rate_strategy(&e, &asset, &rate_strategy);

        e.events().publish(
            (Symbol::new(&e, "set_rate_strategy"), admin),
            (asset, rate_strategy),
        );
    }

    fn set_pause(e: Env, paused: bool) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_set_pause(&e, paused);

        e.events()
            .publish((Symbol::new(&e, "set_pause"), admin), paused);
    }

    fn set_leverage_params(e: Env, max_leverage: u32, pos_liq_threshold: i128, pos_liq_fee: u32) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_set_leverage_params(&e, max_leverage, pos_liq_threshold, pos_liq_fee);

        e.events().publish(
            (Symbol::new(&e, "set_leverage_params"), admin),
            (max_leverage, pos_liq_threshold, pos_liq_fee),
        );
    }

    fn set_exchange(e: Env, exchange: Address) {
        storage::extend_instance(&e);
        let admin = storage::get_admin(&e);
        admin.require_auth();

        pool::execute_set_exchange(&e, &exchange);

        e.events()
            .publish((Symbol::new(&e, "set_exchange"), admin), exchange);
    }

    /********* Lending **********/

    fn deposit(e: Env, from: Address, asset: Address, amount: i128, on_behalf_of: Address) {
        storage::extend_instance(&e);
        from.require_auth();

        pool::execute_deposit(&e, &from, &asset, amount, &on_behalf_of);

        e.events().publish(
            (Symbol::new(&e, "deposit"), asset, from),
            (on_behalf_of, amount),
        );
    }

    fn withdraw(e: Env, from: Address, asset: Address, amount: i128, to: Address) -> i128 {
        storage::extend_instance(&e);
        from.require_auth();

        let amount_withdrawn = pool::execute_withdraw(&e, &from, &asset, amount, &to);

        e.events().publish(
            (Symbol::new(&e, "withdraw"), asset, from),
            (to, amount_withdrawn),
        );
        amount_withdrawn
    }

    fn borrow(e: Env, from: Address, asset: Address, amount: i128, rate_mode: u32) {
        storage::extend_instance(&e);
        from.require_auth();

        pool::execute_borrow(&e, &from, &asset, amount, rate_mode);

        e.events().publish(
            (Symbol::new(&e, "borrow"), asset, from),
            (amount, rate_mode),
        );
    }

    fn repay(
        e: Env,
        from: Address,
        asset: Address,
        amount: i128,
        rate_mode: u32,
        on_behalf_of: Address,
    ) -> i128 {
        storage::extend_instance(&e);
        from.require_auth();

        let amount_repaid =
            pool::execute_repay(&e, &from, &asset, amount, rate_mode, &on_behalf_of);

        e.events().publish(
            (Symbol::new(&e, "repay"), asset, from),
            (on_behalf_of, amount_repaid),
        );
        amount_repaid
    }

    fn set_use_as_collateral(e: Env, from: Address, asset: Address, use_as_collateral: bool) {
        storage::extend_instance(&e);
        from.require_auth();

        pool::execute_set_use_as_collateral(&e, &from, &asset, use_as_collateral);

        let topic = if use_as_collateral {
            "collateral_enabled"
        } else {
            "collateral_disabled"
        };
        e.events()
            .publish((Symbol::new(&e, topic), asset, from), ());
    }

    fn finalize_transfer(
        e: Env,
        asset: Address,
        from: Address,
        to: Address,
        amount: i128,
        from_before: i128,
        to_before: i128,
    ) {
        storage::extend_instance(&e);

        pool::execute_finalize_transfer(&e, &asset, &from, &to, amount, from_before, to_before);

        e.events().publish(
            (Symbol::new(&e, "finalize_transfer"), asset, from),
            (to, amount),
        );
    }

    fn liquidation_call(
        e: Env,
        liquidator: Address,
        collateral_asset: Address,
        debt_asset: Address,
        user: Address,
        debt_to_cover: i128,
        receive_s_token: bool,
    ) -> (i128, i128) {
        storage::extend_instance(&e);
        liquidator.require_auth();

        let (debt_repaid, collateral_seized) = pool::execute_liquidation_call(
            &e,
            &liquidator,
            &collateral_asset,
            &debt_asset,
            &user,
            debt_to_cover,
            receive_s_token,
        );

        e.events().publish(
            (Symbol::new(&e, "liquidation_call"), collateral_asset, user),
            (debt_asset, liquidator, debt_repaid, collateral_seized),
        );
        (debt_repaid, collateral_seized)
    }

    /********* Positions **********/

    fn open_position(
        e: Env,
        trader: Address,
        margin_asset: Address,
        borrowed_asset: Address,
        held_asset: Address,
        margin_amount: i128,
        leverage: u32,
        swap: SwapRoute,
    ) -> u64 {
        storage::extend_instance(&e);
        trader.require_auth();

        let position = pool::execute_open_position(
            &e,
            &trader,
            &margin_asset,
            &borrowed_asset,
            &held_asset,
            margin_amount,
            leverage,
            &swap,
        );

        e.events().publish(
            (Symbol::new(&e, "open_position"), held_asset, trader),
            (
                position.id,
                margin_amount,
                position.borrowed_amount,
                position.held_amount,
            ),
        );
        position.id
    }

    fn close_position(
        e: Env,
        caller: Address,
        id: u64,
        held_swap: SwapRoute,
        margin_swap: Option<SwapRoute>,
    ) -> i128 {
        storage::extend_instance(&e);
        caller.require_auth();

        let payment = pool::execute_close_position(&e, &caller, id, &held_swap, &margin_swap);

        e.events()
            .publish((Symbol::new(&e, "close_position"), caller), (id, payment));
        payment
    }

    fn liquidate_position(
        e: Env,
        liquidator: Address,
        id: u64,
        held_swap: SwapRoute,
        margin_swap: Option<SwapRoute>,
    ) -> (i128, i128) {
        storage::extend_instance(&e);
        liquidator.require_auth();

        let (liquidator_share, trader_share, shortfall) =
            pool::execute_liquidate_position(&e, &liquidator, id, &held_swap, &margin_swap);

        if shortfall > 0 {
            let position = pool::load_position(&e, id);
            e.events().publish(
                (Symbol::new(&e, "bad_debt"), position.borrowed_asset),
                (id, shortfall),
            );
        }
        e.events().publish(
            (Symbol::new(&e, "liquidate_position"), liquidator),
            (id, liquidator_share, trader_share),
        );
        (liquidator_share, trader_share)
    }

    /********* Queries **********/

    fn get_pool_config(e: Env) -> PoolConfig {
        storage::get_pool_config(&e)
    }

    fn get_reserve(e: Env, asset: Address) -> Reserve {
        Reserve::load(&e, &asset)
    }

    fn get_reserve_list(e: Env) -> Vec<Address> {
        storage::get_res_list(&e)
    }

    fn get_normalized_income(e: Env, asset: Address) -> i128 {
        Reserve::load(&e, &asset).normalized_income(&e)
    }

    fn get_normalized_debt(e: Env, asset: Address) -> i128 {
        Reserve::load(&e, &asset).normalized_debt(&e)
    }

    fn get_user_account_data(e: Env, user: Address) -> AccountData {
        let mut pool = PoolState::load(&e);
        let user_config = UserConfiguration::load(&e, &user);
        pool::calculate_user_account_data(&e, &mut pool, &user, &user_config)
    }

    fn get_user_configuration(e: Env, user: Address) -> u128 {
        storage::get_user_config(&e, &user)
    }

    fn get_position(e: Env, id: u64) -> Position {
        pool::load_position(&e, id)
    }

    fn get_trader_positions(e: Env, trader: Address) -> Vec<u64> {
        storage::get_trader_positions(&e, &trader)
    }

    fn get_position_health_factor(e: Env, id: u64) -> i128 {
        let position = pool::load_position(&e, id);
        let mut pool = PoolState::load(&e);
        pool::calculate_position_health_factor(&e, &mut pool, &position)
    }

    fn get_pnl(e: Env, id: u64) -> i128 {
        let position = pool::load_position(&e, id);
        let mut pool = PoolState::load(&e);
        pool::get_pnl(&e, &mut pool, &position)
    }
}
