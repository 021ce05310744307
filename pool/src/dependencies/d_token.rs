use soroban_sdk::{contractclient, Address, Env};

/// The debt token ledger of a reserve. Tracks borrower debt in scaled units
/// (underlying / borrow index).
#[allow(dead_code)]
#[contractclient(name = "DTokenClient")]
pub trait DToken {
    /// Fetch the scaled balance of `id`
    fn scaled_balance_of(e: Env, id: Address) -> i128;

    /// Fetch the scaled total supply
    fn scaled_total_supply(e: Env) -> i128;

    /// (Pool only) Mint `amount` underlying worth of debt to `user` at `index`
    ///
    /// Returns true if `user` had no debt before the mint
    fn mint(e: Env, user: Address, amount: i128, index: i128) -> bool;

    /// (Pool only) Burn `amount` underlying worth of debt from `user` at `index`
    fn burn(e: Env, user: Address, amount: i128, index: i128);
}
