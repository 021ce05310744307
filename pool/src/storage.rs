use soroban_sdk::{
    contracttype, panic_with_error, unwrap::UnwrapOptimized, vec, Address, Env, IntoVal, Symbol,
    TryFromVal, Val, Vec,
};

use crate::{constants::MAX_RESERVES, errors::PoolError};

pub(crate) const LEDGER_THRESHOLD_SHARED: u32 = 172800; // ~ 10 days
pub(crate) const LEDGER_BUMP_SHARED: u32 = 241920; // ~ 14 days

pub(crate) const LEDGER_THRESHOLD_USER: u32 = 518400; // ~ 30 days
pub(crate) const LEDGER_BUMP_USER: u32 = 535670; // ~ 31 days

/********** Storage Types **********/

/// The pool's config
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct PoolConfig {
    pub oracle: Address,
    pub exchange: Address,
    pub max_leverage: u32, // the exclusive upper bound on position leverage, where 10000 is 1x
    pub pos_liq_threshold: i128, // the liquidation threshold snapshotted into new positions, expressed as a ray
    pub pos_liq_fee: u32, // the share of a liquidated position's residual paid to the liquidator, where 10000 is 100%
    pub paused: bool,
}

/// The configuration information about a reserve asset
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct ReserveConfig {
    pub index: u32,          // the index of the reserve in the list
    pub decimals: u32,       // the decimals used by the underlying asset
    pub ltv: u32,            // the maximum loan to value, where 10000 is 100%
    pub liq_threshold: u32,  // the liquidation threshold, where 10000 is 100%
    pub liq_bonus: u32,      // the liquidation bonus, where 10500 is a 5% bonus
    pub reserve_factor: u32, // the share of interest kept by the reserve, where 10000 is 100%
    pub active: bool,
    pub frozen: bool,
    pub borrowing_enabled: bool,
}

/// The data for a reserve asset
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct ReserveData {
    pub liquidity_index: i128, // the cumulative supply growth expressed as a ray
    pub borrow_index: i128,    // the cumulative debt growth expressed as a ray
    pub liquidity_rate: i128,  // the current annual supply rate expressed as a ray
    pub borrow_rate: i128,     // the current annual borrow rate expressed as a ray
    pub last_time: u64,        // the last time the indices were accrued
    pub s_token: Address,
    pub d_token: Address,
    pub rate_strategy: Address,
}

/// A leveraged position. Closed positions are kept as history and never change again.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Position {
    pub id: u64,
    pub trader: Address,
    pub margin_asset: Address,
    pub borrowed_asset: Address,
    pub held_asset: Address,
    pub margin_amount: i128,   // the margin held in custody, in the margin asset's units
    pub borrowed_amount: i128, // the principal borrowed at open, in the borrowed asset's units
    pub held_amount: i128,     // the amount received from the exchange, in the held asset's units
    pub scaled_debt: i128,     // the debt token units minted for the borrow
    pub liq_threshold: i128,   // the liquidation threshold at open expressed as a ray
    pub opened_at: u64,
    pub is_open: bool,
}

/********** Storage Key Types **********/

const ADMIN_KEY: &str = "Admin";
const POOL_CONFIG_KEY: &str = "Config";
const RES_LIST_KEY: &str = "ResList";
const POSITION_COUNT_KEY: &str = "PosCount";

#[derive(Clone)]
#[contracttype]
pub enum PoolDataKey {
    // A map of underlying asset's contract address to reserve config
    ResConfig(Address),
    // A map of underlying asset's contract address to reserve data
    ResData(Address),
    // The collateral and borrowing flags of a user
    UserConfig(Address),
    // A position by id
    Position(u64),
    // The ids of every position opened by a trader
    TraderPositions(Address),
}

/********** Storage **********/

/// Bump the instance rent for the contract
pub fn extend_instance(e: &Env) {
    e.storage()
        .instance()
        .extend_ttl(LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/// Fetch an entry in persistent storage that has a default value if it doesn't exist
fn get_persistent_default<K: IntoVal<Env, Val>, V: TryFromVal<Env, Val>>(
    e: &Env,
    key: &K,
    default: V,
    bump_threshold: u32,
    bump_amount: u32,
) -> V {
    if let Some(result) = e.storage().persistent().get::<K, V>(key) {
        e.storage()
            .persistent()
            .extend_ttl(key, bump_threshold, bump_amount);
        result
    } else {
        default
    }
}

/// Write an entry to persistent storage and bump it
fn set_persistent<K: IntoVal<Env, Val>, V: IntoVal<Env, Val>>(
    e: &Env,
    key: &K,
    value: &V,
    bump_threshold: u32,
    bump_amount: u32,
) {
    e.storage().persistent().set::<K, V>(key, value);
    e.storage()
        .persistent()
        .extend_ttl(key, bump_threshold, bump_amount);
}

/********** Admin **********/

/// Fetch the current admin Address
///
/// ### Panics
/// If the admin does not exist
pub fn get_admin(e: &Env) -> Address {
    e.storage()
        .instance()
        .get(&Symbol::new(e, ADMIN_KEY))
        .unwrap_optimized()
}

/// Set a new admin
///
/// ### Arguments
/// * `new_admin` - The Address for the admin
pub fn set_admin(e: &Env, new_admin: &Address) {
    e.storage()
        .instance()
        .set::<Symbol, Address>(&Symbol::new(e, ADMIN_KEY), new_admin);
}

/// Checks if an admin is set
pub fn has_admin(e: &Env) -> bool {
    e.storage().instance().has(&Symbol::new(e, ADMIN_KEY))
}

/********** Pool Config **********/

/// Fetch the pool configuration
///
/// ### Panics
/// If the pool's config is not set
pub fn get_pool_config(e: &Env) -> PoolConfig {
    e.storage()
        .instance()
        .get(&Symbol::new(e, POOL_CONFIG_KEY))
        .unwrap_optimized()
}

/// Set the pool configuration
///
/// ### Arguments
/// * `config` - The pool configuration
pub fn set_pool_config(e: &Env, config: &PoolConfig) {
    e.storage()
        .instance()
        .set::<Symbol, PoolConfig>(&Symbol::new(e, POOL_CONFIG_KEY), config);
}

/********** Reserve Config (ResConfig) **********/

/// Fetch the reserve configuration for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
///
/// ### Panics
/// If the reserve does not exist
pub fn get_res_config(e: &Env, asset: &Address) -> ReserveConfig {
    let key = PoolDataKey::ResConfig(asset.clone());
    match e.storage().persistent().get::<PoolDataKey, ReserveConfig>(&key) {
        Some(config) => {
            e.storage()
                .persistent()
                .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
            config
        }
        None => panic_with_error!(e, PoolError::ReserveNotFound),
    }
}

/// Set the reserve configuration for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
/// * `config` - The reserve configuration for the asset
pub fn set_res_config(e: &Env, asset: &Address, config: &ReserveConfig) {
    let key = PoolDataKey::ResConfig(asset.clone());
    set_persistent(e, &key, config, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/// Checks if a reserve exists for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
pub fn has_res(e: &Env, asset: &Address) -> bool {
    let key = PoolDataKey::ResConfig(asset.clone());
    e.storage().persistent().has(&key)
}

/********** Reserve Data (ResData) **********/

/// Fetch the reserve data for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
///
/// ### Panics
/// If the reserve does not exist
pub fn get_res_data(e: &Env, asset: &Address) -> ReserveData {
    let key = PoolDataKey::ResData(asset.clone());
    match e.storage().persistent().get::<PoolDataKey, ReserveData>(&key) {
        Some(data) => {
            e.storage()
                .persistent()
                .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
            data
        }
        None => panic_with_error!(e, PoolError::ReserveNotFound),
    }
}

/// Set the reserve data for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
/// * `data` - The reserve data for the asset
pub fn set_res_data(e: &Env, asset: &Address, data: &ReserveData) {
    let key = PoolDataKey::ResData(asset.clone());
    set_persistent(e, &key, data, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/********** Reserve List (ResList) **********/

/// Fetch the list of reserves
pub fn get_res_list(e: &Env) -> Vec<Address> {
    get_persistent_default(
        e,
        &Symbol::new(e, RES_LIST_KEY),
        vec![e],
        LEDGER_THRESHOLD_SHARED,
        LEDGER_BUMP_SHARED,
    )
}

/// Add a reserve to the back of the list and returns the index
///
/// ### Arguments
/// * `asset` - The contract address of the underlying asset
///
/// ### Panics
/// If the number of reserves in the list would exceed the user configuration width
///
// @dev: Once added it can't be removed
pub fn push_res_list(e: &Env, asset: &Address) -> u32 {
    let mut res_list = get_res_list(e);
    if res_list.len() >= MAX_RESERVES {
        panic_with_error!(e, PoolError::MaxReservesReached)
    }
    res_list.push_back(asset.clone());
    let new_index = res_list.len() - 1;
    set_persistent(
        e,
        &Symbol::new(e, RES_LIST_KEY),
        &res_list,
        LEDGER_THRESHOLD_SHARED,
        LEDGER_BUMP_SHARED,
    );
    new_index
}

/********** User Config **********/

/// Fetch the packed collateral and borrowing flags of a user, or zero if none are set
///
/// ### Arguments
/// * `user` - The address of the user
pub fn get_user_config(e: &Env, user: &Address) -> u128 {
    let key = PoolDataKey::UserConfig(user.clone());
    get_persistent_default(e, &key, 0u128, LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER)
}

/// Set the packed collateral and borrowing flags of a user
///
/// ### Arguments
/// * `user` - The address of the user
/// * `config` - The packed flags
pub fn set_user_config(e: &Env, user: &Address, config: &u128) {
    let key = PoolDataKey::UserConfig(user.clone());
    set_persistent(e, &key, config, LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER);
}

/********** Positions **********/

/// Reserve the next position id. Ids start at 1.
pub fn next_position_id(e: &Env) -> u64 {
    let key = Symbol::new(e, POSITION_COUNT_KEY);
    let id = e.storage().instance().get::<Symbol, u64>(&key).unwrap_or(0) + 1;
    e.storage().instance().set::<Symbol, u64>(&key, &id);
    id
}

/// Fetch a position by id
///
/// ### Arguments
/// * `id` - The id of the position
pub fn get_position(e: &Env, id: u64) -> Option<Position> {
    let key = PoolDataKey::Position(id);
    let position = e.storage().persistent().get::<PoolDataKey, Position>(&key);
    if position.is_some() {
        e.storage()
            .persistent()
            .extend_ttl(&key, LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER);
    }
    position
}

/// Set a position
///
/// ### Arguments
/// * `position` - The position to write
pub fn set_position(e: &Env, position: &Position) {
    let key = PoolDataKey::Position(position.id);
    set_persistent(e, &key, position, LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER);
}

/// Fetch the ids of every position a trader has opened
///
/// ### Arguments
/// * `trader` - The address of the trader
pub fn get_trader_positions(e: &Env, trader: &Address) -> Vec<u64> {
    let key = PoolDataKey::TraderPositions(trader.clone());
    get_persistent_default(e, &key, vec![e], LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER)
}

/// Append a position id to a trader's position list
///
/// ### Arguments
/// * `trader` - The address of the trader
/// * `id` - The id of the new position
pub fn push_trader_position(e: &Env, trader: &Address, id: u64) {
    let mut ids = get_trader_positions(e, trader);
    ids.push_back(id);
    let key = PoolDataKey::TraderPositions(trader.clone());
    set_persistent(e, &key, &ids, LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER);
}
