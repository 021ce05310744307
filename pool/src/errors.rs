use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
/// Error codes for the pool contract. Common errors are codes that match up with the built-in
/// contracts error reporting. Pool specific errors start at 1200.
pub enum PoolError {
    // Common Errors
    InternalError = 1,
    AlreadyInitializedError = 3,

    UnauthorizedError = 4,

    NegativeAmountError = 8,
    BalanceError = 10,
    ArithmeticOverflow = 12,

    // Request Errors (start at 1200)
    InvalidAmount = 1200,
    InvalidInterestRateMode = 1201,
    NoExplicitAmountToRepayOnBehalf = 1202,
    InsufficientBalance = 1203,

    // Reserve Errors
    ReserveInactive = 1210,
    ReserveFrozen = 1211,
    BorrowingNotEnabled = 1212,
    ReserveNotFound = 1213,
    ReserveAlreadyInitialized = 1214,
    MaxReservesReached = 1215,
    InvalidReserveParams = 1216,
    ReserveLiquidityNotZero = 1217,
    NotEnoughAvailableLiquidity = 1218,

    // Risk Errors
    InsufficientCollateral = 1220,
    HealthFactorTooLow = 1221,
    CollateralBalanceZero = 1222,
    LtvValidationFailed = 1223,
    BalanceDecreaseNotAllowed = 1224,
    CollateralInUse = 1225,
    UnderlyingBalanceZero = 1226,
    TransferNotAllowed = 1227,
    NoDebtOfSelectedType = 1228,

    // Liquidation Errors
    HealthFactorNotBelowThreshold = 1230,
    CollateralCannotBeLiquidated = 1231,
    CurrencyNotBorrowed = 1232,
    NotEnoughLiquidityToLiquidate = 1233,

    // Position Errors
    InvalidLeverage = 1240,
    SameAssetPosition = 1241,
    PositionNotFound = 1242,
    PositionNotOpen = 1243,
    NotPositionOwner = 1244,
    PositionNotLiquidatable = 1245,
    InvalidSwap = 1246,
    SlippageExceeded = 1247,
    InsufficientProceeds = 1248,

    // Oracle Errors
    StalePrice = 1250,
    InvalidPrice = 1251,

    // Pool Errors
    Paused = 1260,
    InvalidPoolParams = 1261,

    // Math Errors
    DivisionByZero = 1270,
}
