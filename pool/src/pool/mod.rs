mod borrow;
pub use borrow::execute_borrow;

mod collateral;
pub use collateral::{execute_finalize_transfer, execute_set_use_as_collateral};

mod config;
pub use config::{
    execute_configure_reserve_as_collateral, execute_init_reserve, execute_initialize,
    execute_set_exchange, execute_set_leverage_params, execute_set_pause,
    execute_set_rate_strategy, execute_set_reserve_factor, execute_set_reserve_status,
};

mod health_factor;
pub use health_factor::{
    balance_decrease_allowed, calculate_position_health_factor, calculate_user_account_data,
    get_pnl, AccountData,
};

mod leverage;
pub use leverage::{
    execute_close_position, execute_liquidate_position, execute_open_position, load_position,
};

mod liquidation;
pub use liquidation::execute_liquidation_call;

#[allow(clippy::module_inception)]
mod pool;
pub use pool::Pool;

mod repay;
pub use repay::execute_repay;

mod reserve;
pub use reserve::Reserve;

mod supply;
pub use supply::execute_deposit;

mod user_config;
pub use user_config::UserConfiguration;

mod withdrawal;
pub use withdrawal::execute_withdraw;
