#![no_std]

#[cfg(any(test, feature = "testutils"))]
extern crate std;

mod constants;
mod contract;
mod dependencies;
mod errors;
mod math;
mod pool;
mod storage;
mod testutils;
mod validator;

pub use contract::*;
pub use dependencies::{SwapDescription, SwapRoute};
pub use errors::PoolError;
pub use pool::{AccountData, Reserve};
pub use storage::{PoolConfig, PoolDataKey, Position, ReserveConfig, ReserveData};
