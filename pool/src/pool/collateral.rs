use soroban_sdk::{panic_with_error, Address, Env};

use crate::{
    errors::PoolError,
    validator::{require_nonnegative, validate_set_use_as_collateral, validate_transfer},
};

use super::{pool::Pool, user_config::UserConfiguration};

/// Enable or disable the supply of `asset` held by `from` as collateral
pub fn execute_set_use_as_collateral(
    e: &Env,
    from: &Address,
    asset: &Address,
    use_as_collateral: bool,
) {
    let mut pool = Pool::load(e);
    pool.require_not_paused(e);

    let reserve = pool.load_reserve(e, asset);
    let underlying_balance = pool.load_supply_balance(e, &reserve, from);
    let mut user_config = UserConfiguration::load(e, from);
    validate_set_use_as_collateral(
        e,
        &mut pool,
        &reserve,
        from,
        underlying_balance,
        use_as_collateral,
        &user_config,
    );

    user_config.set_collateral(reserve.config.index, use_as_collateral);
    user_config.store(e, from);
}

/// Finalize a transfer of supply tokens of `asset`. Only callable by the reserve's supply token.
///
/// The supply token reports the balances from before the transfer, since it cannot be called
/// back while it is invoking the pool.
///
/// ### Arguments
/// * `amount` - The amount of the underlying transferred
/// * `from_before` - The underlying balance of `from` before the transfer
/// * `to_before` - The underlying balance of `to` before the transfer
///
/// ### Panics
/// If the caller is not the supply token, or the transfer drops `from` below the liquidation
/// boundary
#[allow(clippy::too_many_arguments)]
pub fn execute_finalize_transfer(
    e: &Env,
    asset: &Address,
    from: &Address,
    to: &Address,
    amount: i128,
    from_before: i128,
    to_before: i128,
) {
    let mut pool = Pool::load(e);
    pool.require_not_paused(e);

    let reserve = pool.load_reserve(e, asset);
    reserve.s_token.require_auth();

    require_nonnegative(e, &amount);
    require_nonnegative(e, &to_before);
    let from_after = from_before - amount;
    if from_after < 0 {
        panic_with_error!(e, PoolError::BalanceError);
    }
    pool.set_supply_balance(asset, from, from_after);

    let mut from_config = UserConfiguration::load(e, from);
    validate_transfer(e, &mut pool, from, &from_config);

    if from == to || amount == 0 {
        return;
    }
    if from_after == 0 {
        from_config.set_collateral(reserve.config.index, false);
        from_config.store(e, from);
    }
    if to_before == 0 {
        let mut to_config = UserConfiguration::load(e, to);
        to_config.set_collateral(reserve.config.index, true);
        to_config.store(e, to);
    }
}

#[cfg(test)]
mod tests {
    use crate::testutils;

    use super::*;
    use soroban_sdk::testutils::Address as _;

    #[test]
    fn test_set_use_as_collateral() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 1);
        let samwise = Address::generate(&e);
        fixture.tokens[0].mint(&samwise, &100_0000000);
        fixture
            .pool_client
            .deposit(&samwise, &fixture.assets[0], &100_0000000, &samwise);

        fixture
            .pool_client
            .set_use_as_collateral(&samwise, &fixture.assets[0], &false);
        let account = fixture.pool_client.get_user_account_data(&samwise);
        assert_eq!(account.total_collateral, 0);

        fixture
            .pool_client
            .set_use_as_collateral(&samwise, &fixture.assets[0], &true);
        let account = fixture.pool_client.get_user_account_data(&samwise);
        assert_eq!(account.total_collateral, 100_0000000);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1226)")]
    fn test_set_use_as_collateral_without_supply() {
        let e = Env::default();
        e.mock_all_auths();

        let fixture = testutils::TestFixture::create(&e, 1);
        let samwise = Address::generate(&e);

        fixture
            .pool_client
            .set_use_as_collateral(&samwise, &fixture.assets[0], &true);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1225)")]
    fn test_disable_collateral_backing_debt() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        fixture.supply_liquidity(1, 1000_0000000);
        fixture.tokens[0].mint(&samwise, &1000_0000000);
        fixture
            .pool_client
            .deposit(&samwise, &fixture.assets[0], &1000_0000000, &samwise);
        fixture
            .pool_client
            .borrow(&samwise, &fixture.assets[1], &100_0000000, &2);

        fixture
            .pool_client
            .set_use_as_collateral(&samwise, &fixture.assets[0], &false);
    }

    #[test]
    fn test_transfer_moves_collateral_flags() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 1);
        let samwise = Address::generate(&e);
        let frodo = Address::generate(&e);
        fixture.tokens[0].mint(&samwise, &100_0000000);
        fixture
            .pool_client
            .deposit(&samwise, &fixture.assets[0], &100_0000000, &samwise);

        let s_token = fixture.s_token(0);
        s_token.transfer(&samwise, &frodo, &40_0000000);
        assert_eq!(s_token.scaled_balance_of(&frodo), 40_0000000);
        e.as_contract(&fixture.pool, || {
            assert!(UserConfiguration::load(&e, &samwise).is_collateral(0));
            assert!(UserConfiguration::load(&e, &frodo).is_collateral(0));
        });

        s_token.transfer(&samwise, &frodo, &60_0000000);
        assert_eq!(s_token.scaled_balance_of(&samwise), 0);
        e.as_contract(&fixture.pool, || {
            assert!(!UserConfiguration::load(&e, &samwise).is_collateral(0));
            assert!(UserConfiguration::load(&e, &frodo).is_collateral(0));
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1227)")]
    fn test_transfer_backing_debt() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        let frodo = Address::generate(&e);
        fixture.supply_liquidity(1, 1000_0000000);
        fixture.tokens[0].mint(&samwise, &1000_0000000);
        fixture
            .pool_client
            .deposit(&samwise, &fixture.assets[0], &1000_0000000, &samwise);
        fixture
            .pool_client
            .borrow(&samwise, &fixture.assets[1], &500_0000000, &2);

        // 700 * 0.65 / 500 = 0.91
        fixture.s_token(0).transfer(&samwise, &frodo, &300_0000000);
    }

    #[test]
    #[should_panic]
    fn test_finalize_transfer_requires_s_token() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 1);
        let samwise = Address::generate(&e);
        let frodo = Address::generate(&e);

        e.set_auths(&[]);
        fixture.pool_client.finalize_transfer(
            &fixture.assets[0],
            &samwise,
            &frodo,
            &10_0000000,
            &10_0000000,
            &0,
        );
    }
}
