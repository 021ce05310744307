use soroban_sdk::{Address, Env};

use crate::{
    dependencies::{DTokenClient, STokenClient},
    validator::validate_borrow,
};

use super::{pool::Pool, user_config::UserConfiguration};

/// Borrow `amount` of `asset` against the collateral of `from`
pub fn execute_borrow(e: &Env, from: &Address, asset: &Address, amount: i128, rate_mode: u32) {
    let mut pool = Pool::load(e);
    pool.require_not_paused(e);

    let mut reserve = pool.load_reserve(e, asset);
    let mut user_config = UserConfiguration::load(e, from);
    validate_borrow(e, &mut pool, &reserve, from, amount, rate_mode, &user_config);

    reserve.update_state(e);
    let is_first =
        DTokenClient::new(e, &reserve.d_token).mint(from, &amount, &reserve.borrow_index);
    if is_first {
        user_config.set_borrowing(reserve.config.index, true);
        user_config.store(e, from);
    }
    reserve.update_interest_rates(e, 0, amount);

    STokenClient::new(e, &reserve.s_token).transfer_underlying_to(from, &amount);

    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
}

#[cfg(test)]
mod tests {
    use crate::{constants::RAY, testutils};

    use super::*;
    use soroban_sdk::testutils::Address as _;

    #[test]
    fn test_borrow_scenario_accepted() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        fixture.supply_liquidity(1, 2000_0000000);
        fixture.tokens[0].mint(&samwise, &1000_0000000);
        fixture
            .pool_client
            .deposit(&samwise, &fixture.assets[0], &1000_0000000, &samwise);

        fixture
            .pool_client
            .borrow(&samwise, &fixture.assets[1], &500_0000000, &2);

        assert_eq!(fixture.tokens[1].balance(&samwise), 500_0000000);
        assert_eq!(fixture.d_token(1).scaled_balance_of(&samwise), 500_0000000);
        let account = fixture.pool_client.get_user_account_data(&samwise);
        assert_eq!(account.health_factor, 1_300_000_000_000_000_000);

        e.as_contract(&fixture.pool, || {
            let config = UserConfiguration::load(&e, &samwise);
            assert!(config.is_collateral(0));
            assert!(config.is_borrowing(1));
            assert!(!config.is_borrowing(0));
        });

        // 500 borrowed of 2000 supplied, 25% utilization
        let reserve = fixture.pool_client.get_reserve(&fixture.assets[1]);
        assert_eq!(reserve.borrow_rate, 0_012_500_000_000_000_000_000_000_000);
        assert!(reserve.liquidity_rate > 0);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1220)")]
    fn test_borrow_scenario_rejected() {
        let e = Env::default();
        e.mock_all_auths();
        testutils::set_ledger(&e, 1000);

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        fixture.supply_liquidity(1, 2000_0000000);
        fixture.tokens[0].mint(&samwise, &1000_0000000);
        fixture
            .pool_client
            .deposit(&samwise, &fixture.assets[0], &1000_0000000, &samwise);

        fixture
            .pool_client
            .borrow(&samwise, &fixture.assets[1], &700_0000000, &2);
    }

    #[test]
    fn test_borrow_debt_accrues() {
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
            .borrow(&samwise, &fixture.assets[1], &400_0000000, &2);

        testutils::set_ledger(&e, 1000 + 31536000);
        fixture.set_prices(&[1_0000000, 1_0000000]);
        let debt_index = fixture.pool_client.get_normalized_debt(&fixture.assets[1]);
        let income_index = fixture.pool_client.get_normalized_income(&fixture.assets[1]);
        assert!(debt_index > RAY);
        assert!(income_index > RAY);
        // suppliers earn less than borrowers pay
        assert!(income_index < debt_index);

        let account = fixture.pool_client.get_user_account_data(&samwise);
        assert!(account.total_debt > 400_0000000);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1201)")]
    fn test_borrow_stable_rate_mode() {
        let e = Env::default();
        e.mock_all_auths();

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        fixture.supply_liquidity(1, 2000_0000000);
        fixture.tokens[0].mint(&samwise, &1000_0000000);
        fixture
            .pool_client
            .deposit(&samwise, &fixture.assets[0], &1000_0000000, &samwise);

        fixture
            .pool_client
            .borrow(&samwise, &fixture.assets[1], &100_0000000, &1);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1212)")]
    fn test_borrow_disabled() {
        let e = Env::default();
        e.mock_all_auths();

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        fixture.supply_liquidity(1, 2000_0000000);
        fixture
            .pool_client
            .set_reserve_status(&fixture.assets[1], &true, &false, &false);
        fixture.tokens[0].mint(&samwise, &1000_0000000);
        fixture
            .pool_client
            .deposit(&samwise, &fixture.assets[0], &1000_0000000, &samwise);

        fixture
            .pool_client
            .borrow(&samwise, &fixture.assets[1], &100_0000000, &2);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1218)")]
    fn test_borrow_more_than_available() {
        let e = Env::default();
        e.mock_all_auths();

        let fixture = testutils::TestFixture::create(&e, 2);
        let samwise = Address::generate(&e);
        fixture.supply_liquidity(1, 50_0000000);
        fixture.tokens[0].mint(&samwise, &1000_0000000);
        fixture
            .pool_client
            .deposit(&samwise, &fixture.assets[0], &1000_0000000, &samwise);

        fixture
            .pool_client
            .borrow(&samwise, &fixture.assets[1], &100_0000000, &2);
    }
}
