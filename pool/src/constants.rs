/********** Numbers **********/

/// Fixed-point scalar for ray numbers (27 decimals)
pub const RAY: i128 = 1_000_000_000_000_000_000_000_000_000;
pub const HALF_RAY: i128 = RAY / 2;

/// Fixed-point scalar for wad numbers (18 decimals)
pub const WAD: i128 = 1_000_000_000_000_000_000;
pub const HALF_WAD: i128 = WAD / 2;

pub const WAD_RAY_RATIO: i128 = 1_000_000_000;

/// Percentages are expressed in 2 decimals of precision, where 10000 is 100.00%
pub const PERCENTAGE_FACTOR: i128 = 1_0000;
pub const HALF_PERCENT: i128 = PERCENTAGE_FACTOR / 2;

// seconds per year
pub const SECONDS_PER_YEAR: i128 = 31536000;

/********** Risk **********/

/// A health factor below one wad allows liquidation
pub const HEALTH_FACTOR_LIQUIDATION_THRESHOLD: i128 = WAD;

/// Share of a user's debt that can be covered by a single liquidation call
pub const LIQUIDATION_CLOSE_FACTOR: u32 = 5000;

/// The only supported interest rate mode (variable)
pub const VARIABLE_RATE_MODE: u32 = 2;

/// One times leverage, in percentage precision
pub const LEVERAGE_ONE: u32 = 1_0000;

/********** Limits **********/

/// Two bits per reserve in a u128 user configuration
pub const MAX_RESERVES: u32 = 64;

/// Oracle prices older than this are rejected
pub const MAX_PRICE_AGE: u64 = 24 * 60 * 60;
