#![no_std]

#[cfg(any(test, feature = "testutils"))]
extern crate std;

mod constants;
mod contract;
mod errors;
mod math;
mod storage;

pub use contract::*;
pub use errors::StrategyError;
pub use storage::InterestRateParams;
