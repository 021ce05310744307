#![cfg(test)]

use crate::{
    constants::RAY,
    dependencies::{SwapDescription, SwapRoute},
    math::{ray_div, ray_mul},
    pool::Reserve,
    storage::{PoolConfig, ReserveConfig},
    PoolClient, PoolContract,
};
use rate_strategy::{InterestRateParams, RateStrategyClient as StrategyClient, RateStrategyContract};
use sep_40_oracle::testutils::{Asset, MockPriceOracleClient, MockPriceOracleWASM};
use sep_41_token::{
    testutils::{MockTokenClient, MockTokenWASM},
    TokenClient,
};
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{
    contract, contractimpl, contracttype,
    testutils::{Address as _, Ledger, LedgerInfo},
    unwrap::UnwrapOptimized,
    Address, Bytes, Env, IntoVal, Symbol, Vec as SorobanVec,
};
use std::vec::Vec;

pub(crate) const SCALAR_7: i128 = 1_0000000;

pub(crate) fn create_pool(e: &Env) -> Address {
    e.register_contract(None, PoolContract {})
}

pub(crate) fn set_ledger(e: &Env, timestamp: u64) {
    e.ledger().set(LedgerInfo {
        timestamp,
        protocol_version: 20,
        sequence_number: 1234,
        network_id: Default::default(),
        base_reserve: 10,
        min_temp_entry_ttl: 10,
        min_persistent_entry_ttl: 10,
        max_entry_ttl: 2000000,
    });
}

//************************************************
//           External Contract Helpers
//************************************************

// ***** Token *****

pub(crate) fn create_token_contract<'a>(
    e: &Env,
    admin: &Address,
) -> (Address, MockTokenClient<'a>) {
    let contract_address = Address::generate(e);
    e.register_contract_wasm(&contract_address, MockTokenWASM);
    let client = MockTokenClient::new(e, &contract_address);
    client.initialize(admin, &7, &"unit".into_val(e), &"test".into_val(e));
    (contract_address, client)
}

//***** Oracle ******

pub(crate) fn create_mock_oracle<'a>(e: &Env) -> (Address, MockPriceOracleClient<'a>) {
    let contract_address = e.register_contract_wasm(None, MockPriceOracleWASM);
    (
        contract_address.clone(),
        MockPriceOracleClient::new(e, &contract_address),
    )
}

//***** Rate Strategy ******

pub(crate) fn default_rate_params() -> InterestRateParams {
    InterestRateParams {
        optimal_utilization: 800_000_000_000_000_000_000_000_000,
        base_rate: 0,
        slope_1: 0_040_000_000_000_000_000_000_000_000,
        slope_2: 0_750_000_000_000_000_000_000_000_000,
    }
}

pub(crate) fn create_rate_strategy(e: &Env, admin: &Address) -> Address {
    let contract_address = e.register_contract(None, RateStrategyContract {});
    StrategyClient::new(e, &contract_address).initialize(admin, &default_rate_params());
    contract_address
}

//***** Supply Token ******

#[derive(Clone)]
#[contracttype]
pub enum MockLedgerKey {
    Pool,
    Asset,
    Total,
    Balance(Address),
}

fn read_scaled(e: &Env, user: &Address) -> i128 {
    e.storage()
        .instance()
        .get(&MockLedgerKey::Balance(user.clone()))
        .unwrap_or(0)
}

fn read_total(e: &Env) -> i128 {
    e.storage()
        .instance()
        .get(&MockLedgerKey::Total)
        .unwrap_or(0)
}

fn read_pool(e: &Env) -> Address {
    e.storage()
        .instance()
        .get(&MockLedgerKey::Pool)
        .unwrap_optimized()
}

fn add_scaled(e: &Env, user: &Address, scaled: i128) -> i128 {
    let balance = read_scaled(e, user);
    e.storage()
        .instance()
        .set(&MockLedgerKey::Balance(user.clone()), &(balance + scaled));
    e.storage()
        .instance()
        .set(&MockLedgerKey::Total, &(read_total(e) + scaled));
    balance
}

fn remove_scaled(e: &Env, user: &Address, scaled: i128) {
    let balance = read_scaled(e, user);
    // rounding dust of a full burn
    let removed = if scaled >= balance && scaled - balance <= 1 {
        balance
    } else {
        scaled
    };
    if removed > balance {
        panic!("insufficient balance");
    }
    e.storage()
        .instance()
        .set(&MockLedgerKey::Balance(user.clone()), &(balance - removed));
    e.storage()
        .instance()
        .set(&MockLedgerKey::Total, &(read_total(e) - removed));
}

mod s_token_mock {
    use super::*;

    /// A supply token ledger that holds a reserve's liquidity and tracks scaled balances
    #[contract]
    pub struct MockSToken;

    #[contractimpl]
    impl MockSToken {
        pub fn initialize(e: Env, pool: Address, asset: Address) {
            e.storage().instance().set(&MockLedgerKey::Pool, &pool);
            e.storage().instance().set(&MockLedgerKey::Asset, &asset);
        }

        pub fn scaled_balance_of(e: Env, id: Address) -> i128 {
            read_scaled(&e, &id)
        }

        pub fn scaled_total_supply(e: Env) -> i128 {
            read_total(&e)
        }

        pub fn mint(e: Env, user: Address, amount: i128, index: i128) -> bool {
            read_pool(&e).require_auth();
            add_scaled(&e, &user, ray_div(&e, amount, index)) == 0
        }

        pub fn burn(e: Env, user: Address, receiver: Address, amount: i128, index: i128) {
            read_pool(&e).require_auth();
            remove_scaled(&e, &user, ray_div(&e, amount, index));
            let asset: Address = e
                .storage()
                .instance()
                .get(&MockLedgerKey::Asset)
                .unwrap_optimized();
            TokenClient::new(&e, &asset).transfer(&e.current_contract_address(), &receiver, &amount);
        }

        pub fn transfer_on_liquidation(e: Env, from: Address, to: Address, amount: i128, index: i128) {
            read_pool(&e).require_auth();
            let scaled = ray_div(&e, amount, index);
            remove_scaled(&e, &from, scaled);
            add_scaled(&e, &to, scaled);
        }

        pub fn transfer_underlying_to(e: Env, target: Address, amount: i128) -> i128 {
            read_pool(&e).require_auth();
            let asset: Address = e
                .storage()
                .instance()
                .get(&MockLedgerKey::Asset)
                .unwrap_optimized();
            TokenClient::new(&e, &asset).transfer(&e.current_contract_address(), &target, &amount);
            amount
        }

        pub fn handle_repayment(e: Env, _user: Address, _amount: i128) {
            read_pool(&e).require_auth();
        }

        pub fn transfer(e: Env, from: Address, to: Address, amount: i128) {
            from.require_auth();
            let asset: Address = e
                .storage()
                .instance()
                .get(&MockLedgerKey::Asset)
                .unwrap_optimized();
            let pool_client = PoolClient::new(&e, &read_pool(&e));
            let index = pool_client.get_normalized_income(&asset);

            let from_before = ray_mul(&e, read_scaled(&e, &from), index);
            let to_before = ray_mul(&e, read_scaled(&e, &to), index);
            let scaled = ray_div(&e, amount, index);
            remove_scaled(&e, &from, scaled);
            add_scaled(&e, &to, scaled);

            pool_client.finalize_transfer(&asset, &from, &to, &amount, &from_before, &to_before);
        }
    }
}
pub(crate) use s_token_mock::{MockSToken, MockSTokenClient};

pub(crate) fn create_s_token(e: &Env, pool: &Address, asset: &Address) -> Address {
    let contract_address = e.register_contract(None, MockSToken {});
    MockSTokenClient::new(e, &contract_address).initialize(pool, asset);
    contract_address
}

//***** Debt Token ******

mod d_token_mock {
    use super::*;

    /// A debt token ledger tracking scaled debt balances
    #[contract]
    pub struct MockDToken;

    #[contractimpl]
    impl MockDToken {
        pub fn initialize(e: Env, pool: Address) {
            e.storage().instance().set(&MockLedgerKey::Pool, &pool);
        }

        pub fn scaled_balance_of(e: Env, id: Address) -> i128 {
            read_scaled(&e, &id)
        }

        pub fn scaled_total_supply(e: Env) -> i128 {
            read_total(&e)
        }

        pub fn mint(e: Env, user: Address, amount: i128, index: i128) -> bool {
            read_pool(&e).require_auth();
            add_scaled(&e, &user, ray_div(&e, amount, index)) == 0
        }

        pub fn burn(e: Env, user: Address, amount: i128, index: i128) {
            read_pool(&e).require_auth();
            remove_scaled(&e, &user, ray_div(&e, amount, index));
        }
    }
}
pub(crate) use d_token_mock::{MockDToken, MockDTokenClient};

pub(crate) fn create_d_token(e: &Env, pool: &Address) -> Address {
    let contract_address = e.register_contract(None, MockDToken {});
    MockDTokenClient::new(e, &contract_address).initialize(pool);
    contract_address
}

//***** Exchange ******

#[derive(Clone)]
#[contracttype]
pub enum MockExchangeKey {
    Rate(Address, Address),
}

mod exchange_mock {
    use super::*;

    /// An exchange paying out of its own balance at fixed rates, 1:1 unless set
    #[contract]
    pub struct MockExchange;

    #[contractimpl]
    impl MockExchange {
        /// Set the amount of `dst` paid per unit of `src`, with 7 decimals
        pub fn set_rate(e: Env, src: Address, dst: Address, rate: i128) {
            e.storage()
                .instance()
                .set(&MockExchangeKey::Rate(src, dst), &rate);
        }

        pub fn swap(e: Env, _executor: Address, desc: SwapDescription, _data: Bytes) -> i128 {
            let rate: i128 = e
                .storage()
                .instance()
                .get(&MockExchangeKey::Rate(
                    desc.src_token.clone(),
                    desc.dst_token.clone(),
                ))
                .unwrap_or(SCALAR_7);
            let amount_out = desc.amount.fixed_mul_floor(rate, SCALAR_7).unwrap();
            TokenClient::new(&e, &desc.dst_token).transfer(
                &e.current_contract_address(),
                &desc.dst_receiver,
                &amount_out,
            );
            amount_out
        }
    }
}
pub(crate) use exchange_mock::{MockExchange, MockExchangeClient};

pub(crate) fn create_mock_exchange<'a>(e: &Env) -> (Address, MockExchangeClient<'a>) {
    let contract_address = e.register_contract(None, MockExchange {});
    (
        contract_address.clone(),
        MockExchangeClient::new(e, &contract_address),
    )
}

//************************************************
//           Object Creation Helpers
//************************************************

pub(crate) fn default_pool_config(e: &Env, oracle: &Address) -> PoolConfig {
    PoolConfig {
        oracle: oracle.clone(),
        exchange: Address::generate(e),
        max_leverage: 5_0000,
        pos_liq_threshold: RAY / 10 * 8,
        pos_liq_fee: 1000,
        paused: false,
    }
}

pub(crate) fn default_reserve_config() -> ReserveConfig {
    ReserveConfig {
        index: 0,
        decimals: 7,
        ltv: 6000,
        liq_threshold: 6500,
        liq_bonus: 10500,
        reserve_factor: 1000,
        active: true,
        frozen: false,
        borrowing_enabled: true,
    }
}

pub(crate) fn default_reserve(e: &Env) -> Reserve {
    Reserve {
        asset: Address::generate(e),
        config: default_reserve_config(),
        liquidity_index: RAY,
        borrow_index: RAY,
        liquidity_rate: 0,
        borrow_rate: 0,
        last_time: 0,
        s_token: Address::generate(e),
        d_token: Address::generate(e),
        rate_strategy: Address::generate(e),
        scalar: SCALAR_7,
    }
}

//************************************************
//           Fixture
//************************************************

/// A pool with `n` reserves using the default reserve config, all priced at 1 by the oracle
pub(crate) struct TestFixture<'a> {
    pub env: Env,
    pub admin: Address,
    pub pool: Address,
    pub pool_client: PoolClient<'a>,
    pub oracle_client: MockPriceOracleClient<'a>,
    pub exchange: Address,
    pub exchange_client: MockExchangeClient<'a>,
    pub assets: Vec<Address>,
    pub tokens: Vec<MockTokenClient<'a>>,
    pub s_tokens: Vec<Address>,
    pub d_tokens: Vec<Address>,
}

impl<'a> TestFixture<'a> {
    pub fn create(e: &Env, n: u32) -> TestFixture<'a> {
        e.budget().reset_unlimited();

        let admin = Address::generate(e);
        let pool = create_pool(e);
        let pool_client = PoolClient::new(e, &pool);
        let (oracle, oracle_client) = create_mock_oracle(e);
        let (exchange, exchange_client) = create_mock_exchange(e);
        let strategy = create_rate_strategy(e, &admin);
        pool_client.initialize(&admin, &oracle, &exchange, &5_0000, &(RAY / 10 * 8), &1000);

        let mut fixture = TestFixture {
            env: e.clone(),
            admin: admin.clone(),
            pool: pool.clone(),
            pool_client,
            oracle_client,
            exchange: exchange.clone(),
            exchange_client,
            assets: Vec::new(),
            tokens: Vec::new(),
            s_tokens: Vec::new(),
            d_tokens: Vec::new(),
        };

        let mut oracle_assets = SorobanVec::new(e);
        let mut prices = SorobanVec::new(e);
        for _ in 0..n {
            let (asset, token) = create_token_contract(e, &admin);
            let s_token = create_s_token(e, &pool, &asset);
            let d_token = create_d_token(e, &pool);
            fixture.pool_client.init_reserve(
                &asset,
                &s_token,
                &d_token,
                &strategy,
                &default_reserve_config(),
            );
            token.mint(&exchange, &1_000_000_0000000);

            oracle_assets.push_back(Asset::Stellar(asset.clone()));
            prices.push_back(SCALAR_7);
            fixture.assets.push(asset);
            fixture.tokens.push(token);
            fixture.s_tokens.push(s_token);
            fixture.d_tokens.push(d_token);
        }
        fixture.oracle_client.set_data(
            &admin,
            &Asset::Other(Symbol::new(e, "USD")),
            &oracle_assets,
            &7,
            &300,
        );
        fixture.oracle_client.set_price_stable(&prices);
        fixture
    }

    pub fn s_token(&self, index: usize) -> MockSTokenClient<'a> {
        MockSTokenClient::new(&self.env, &self.s_tokens[index])
    }

    pub fn d_token(&self, index: usize) -> MockDTokenClient<'a> {
        MockDTokenClient::new(&self.env, &self.d_tokens[index])
    }

    /// Deposit `amount` of the reserve at `index` from a new supplier
    pub fn supply_liquidity(&self, index: usize, amount: i128) {
        let supplier = Address::generate(&self.env);
        self.tokens[index].mint(&supplier, &amount);
        self.pool_client
            .deposit(&supplier, &self.assets[index], &amount, &supplier);
    }

    pub fn set_reserve_collateral(&self, index: usize, ltv: u32, liq_threshold: u32, liq_bonus: u32) {
        self.pool_client.configure_reserve_as_collateral(
            &self.assets[index],
            &ltv,
            &liq_threshold,
            &liq_bonus,
        );
    }

    /// Set the oracle price of every reserve, with 7 decimals
    pub fn set_prices(&self, prices: &[i128]) {
        let mut oracle_prices = SorobanVec::new(&self.env);
        for price in prices {
            oracle_prices.push_back(*price);
        }
        self.oracle_client.set_price_stable(&oracle_prices);
    }

    /// A route through the mock exchange from the reserve at `src` to the reserve at `dst`
    pub fn swap_route(&self, src: usize, dst: usize, min_return_amount: i128) -> SwapRoute {
        SwapRoute {
            executor: self.exchange.clone(),
            desc: SwapDescription {
                src_token: self.assets[src].clone(),
                dst_token: self.assets[dst].clone(),
                src_receiver: self.exchange.clone(),
                dst_receiver: self.exchange.clone(),
                amount: 0,
                min_return_amount,
            },
            data: Bytes::new(&self.env),
        }
    }
}
