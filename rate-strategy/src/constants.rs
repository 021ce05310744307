/// Fixed-point scalar for ray numbers (27 decimals)
pub const RAY: i128 = 1_000_000_000_000_000_000_000_000_000;
pub const HALF_RAY: i128 = RAY / 2;

/// Percentages are expressed in 2 decimals of precision, where 10000 is 100.00%
pub const PERCENTAGE_FACTOR: i128 = 1_0000;
pub const HALF_PERCENT: i128 = PERCENTAGE_FACTOR / 2;
