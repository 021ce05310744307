use soroban_sdk::contracterror;

/// Error codes for the interest rate strategy contract. Common errors are codes that match up with
/// the built-in contracts error reporting. Strategy specific errors start at 1300.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum StrategyError {
    // Common Errors
    InternalError = 1,
    AlreadyInitializedError = 3,
    UnauthorizedError = 4,
    NegativeAmountError = 8,
    ArithmeticOverflow = 12,

    // Strategy Errors
    InvalidRateParams = 1300,
    InvalidReserveFactor = 1301,
}
