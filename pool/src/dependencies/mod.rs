mod s_token;
pub use s_token::STokenClient;

mod d_token;
pub use d_token::DTokenClient;

mod rate_strategy;
pub use rate_strategy::RateStrategyClient;

mod exchange;
pub use exchange::{ExchangeClient, SwapDescription, SwapRoute};
