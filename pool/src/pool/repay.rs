use sep_41_token::TokenClient;
use soroban_sdk::{Address, Env};

use crate::{
    dependencies::{DTokenClient, STokenClient},
    validator::validate_repay,
};

use super::{pool::Pool, user_config::UserConfiguration};

/// Repay up to `amount` of the `asset` debt of `on_behalf_of` with funds from `from`. An amount
/// of i128::MAX repays the full debt.
///
/// Returns the amount repaid
pub fn execute_repay(
    e: &Env,
    from: &Address,
    asset: &Address,
    amount: i128,
    rate_mode: u32,
    on_behalf_of: &Address,
) -> i128 {
    let mut pool = Pool::load(e);
    pool.require_not_paused(e);

    let mut reserve = pool.load_reserve(e, asset);
    let variable_debt = pool.load_debt_balance(e, &reserve, on_behalf_of);
    validate_repay(
        e,
        &reserve,
        amount,
        rate_mode,
        from,
        on_behalf_of,
        variable_debt,
    );
    let payback = amount.min(variable_debt);

    reserve.update_state(e);
    DTokenClient::new(e, &reserve.d_token).burn(on_behalf_of, &payback, &reserve.borrow_index);
    reserve.update_interest_rates(e, payback, 0);

    if payback == variable_debt {
        let mut user_config = UserConfiguration::load(e, on_behalf_of);
        user_config.set_borrowing(reserve.config.index, false);
        user_config.store(e, on_behalf_of);
    }

    TokenClient::new(e, asset).transfer(from, &reserve.s_token, &payback);
    STokenClient::new(e, &reserve.s_token).handle_repayment(from, &payback);

    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
    payback
}

#[cfg(test)]
mod tests {
    use crate::testutils;

    use super::*;
    use soroban_sdk::testutils::Address as _;

    fn setup_borrower(e: &Env, fixture: &testutils::TestFixture, borrower: &Address) {
        fixture.supply_liquidity(1, 1000_0000000);
        fixture.tokens[0].mint(borrower, &1000_0000000);
        fixture
            .pool_client
            .deposit(borrower, &fixture.assets[0], &1000_0000000, borrower);
        fixture
            .pool_client
            .borrow(borrower, &fixture.assets[1], &400_0000000, &2);
        e.budget().reset_unlimited();
    }

    #[test]
    fn test_repay_partial() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        setup_borrower(&e, &fixture, &samwise);

        let repaid = fixture
            .pool_client
            .repay(&samwise, &fixture.assets[1], &150_0000000, &2, &samwise);

        assert_eq!(repaid, 150_0000000);
        assert_eq!(fixture.tokens[1].balance(&samwise), 250_0000000);
        assert_eq!(fixture.d_token(1).scaled_balance_of(&samwise), 250_0000000);
        assert_eq!(
            fixture.tokens[1].balance(&fixture.s_token(1).address),
            750_0000000
        );
        e.as_contract(&fixture.pool, || {
            assert!(UserConfiguration::load(&e, &samwise).is_borrowing(1));
        });
    }

    #[test]
    fn test_repay_max_settles_debt() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        setup_borrower(&e, &fixture, &samwise);
        fixture.tokens[1].mint(&samwise, &100_0000000);

        testutils::set_ledger(&e, 1000 + 86400 * 30);
        fixture.set_prices(&[1_0000000, 1_0000000]);
        let repaid = fixture
            .pool_client
            .repay(&samwise, &fixture.assets[1], &i128::MAX, &2, &samwise);

        assert!(repaid > 400_0000000);
        assert_eq!(fixture.tokens[1].balance(&samwise), 500_0000000 - repaid);
        assert_eq!(fixture.d_token(1).scaled_balance_of(&samwise), 0);
        e.as_contract(&fixture.pool, || {
            let config = UserConfiguration::load(&e, &samwise);
            assert!(!config.is_borrowing(1));
            assert!(config.is_collateral(0));
        });
    }

    #[test]
    fn test_repay_on_behalf_of() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        let frodo = Address::generate(&e);
        setup_borrower(&e, &fixture, &samwise);
        fixture.tokens[1].mint(&frodo, &1000_0000000);

        // overpaying on behalf of another user only repays the debt
        let repaid = fixture
            .pool_client
            .repay(&frodo, &fixture.assets[1], &1000_0000000, &2, &samwise);

        assert_eq!(repaid, 400_0000000);
        assert_eq!(fixture.tokens[1].balance(&frodo), 600_0000000);
        assert_eq!(fixture.tokens[1].balance(&samwise), 400_0000000);
        assert_eq!(fixture.d_token(1).scaled_balance_of(&samwise), 0);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1202)")]
    fn test_repay_max_on_behalf_of() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        let frodo = Address::generate(&e);
        setup_borrower(&e, &fixture, &samwise);
        fixture.tokens[1].mint(&frodo, &1000_0000000);

        fixture
            .pool_client
            .repay(&frodo, &fixture.assets[1], &i128::MAX, &2, &samwise);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1228)")]
    fn test_repay_without_debt() {
        let e = Env::default();
        e.mock_all_auths();

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        fixture.tokens[1].mint(&samwise, &100_0000000);

        fixture
            .pool_client
            .repay(&samwise, &fixture.assets[1], &100_0000000, &2, &samwise);
    }
}
