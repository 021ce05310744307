use soroban_sdk::{contracttype, unwrap::UnwrapOptimized, Address, Env, Symbol};

pub(crate) const LEDGER_THRESHOLD: u32 = 172800; // ~ 10 days
pub(crate) const LEDGER_BUMP: u32 = 241920; // ~ 14 days

const ADMIN_KEY: &str = "Admin";
const PARAMS_KEY: &str = "Params";

/// The parameters of the utilization based rate curve. Every value is expressed as a ray.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct InterestRateParams {
    pub optimal_utilization: i128, // the utilization where the curve steepens
    pub base_rate: i128,           // the borrow rate at zero utilization
    pub slope_1: i128,             // the borrow rate added up to the optimal utilization
    pub slope_2: i128,             // the borrow rate added from the optimal to full utilization
}

/// Bump the instance rent for the contract
pub fn extend_instance(e: &Env) {
    e.storage()
        .instance()
        .extend_ttl(LEDGER_THRESHOLD, LEDGER_BUMP);
}

/// Fetch the current admin Address
///
/// ### Panics
/// If the admin does not exist
pub fn get_admin(e: &Env) -> Address {
    e.storage()
        .instance()
        .get(&Symbol::new(e, ADMIN_KEY))
        .unwrap_optimized()
}

/// Set a new admin
pub fn set_admin(e: &Env, new_admin: &Address) {
    e.storage()
        .instance()
        .set::<Symbol, Address>(&Symbol::new(e, ADMIN_KEY), new_admin);
}

/// Checks if an admin is set
pub fn has_admin(e: &Env) -> bool {
    e.storage().instance().has(&Symbol::new(e, ADMIN_KEY))
}

/// Fetch the rate curve parameters
///
/// ### Panics
/// If the parameters do not exist
pub fn get_params(e: &Env) -> InterestRateParams {
    e.storage()
        .instance()
        .get(&Symbol::new(e, PARAMS_KEY))
        .unwrap_optimized()
}

/// Set the rate curve parameters
pub fn set_params(e: &Env, params: &InterestRateParams) {
    e.storage()
        .instance()
        .set::<Symbol, InterestRateParams>(&Symbol::new(e, PARAMS_KEY), params);
}
