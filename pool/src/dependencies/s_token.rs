use soroban_sdk::{contractclient, Address, Env};

/// The supply token ledger of a reserve. Holds the reserve's underlying liquidity and
/// tracks supplier balances in scaled units (underlying / liquidity index).
#[allow(dead_code)]
#[contractclient(name = "STokenClient")]
pub trait SToken {
    /// Fetch the scaled balance of `id`
    fn scaled_balance_of(e: Env, id: Address) -> i128;

    /// Fetch the scaled total supply
    fn scaled_total_supply(e: Env) -> i128;

    /// (Pool only) Mint `amount` underlying worth of tokens to `user` at `index`
    ///
    /// Returns true if `user` had no balance before the mint
    fn mint(e: Env, user: Address, amount: i128, index: i128) -> bool;

    /// (Pool only) Burn `amount` underlying worth of tokens from `user` at `index` and send
    /// the underlying to `receiver`
    fn burn(e: Env, user: Address, receiver: Address, amount: i128, index: i128);

    /// (Pool only) Move `amount` underlying worth of tokens from `from` to `to` at `index`
    /// without finalizing the transfer through the pool
    fn transfer_on_liquidation(e: Env, from: Address, to: Address, amount: i128, index: i128);

    /// (Pool only) Send `amount` of the underlying to `target`
    fn transfer_underlying_to(e: Env, target: Address, amount: i128) -> i128;

    /// (Pool only) Notify the ledger that `amount` of the underlying was repaid by `user`
    fn handle_repayment(e: Env, user: Address, amount: i128);
}
