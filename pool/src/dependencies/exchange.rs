use soroban_sdk::{contractclient, contracttype, Address, Bytes, Env};

/// The description of a single swap through the exchange
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct SwapDescription {
    pub src_token: Address,
    pub dst_token: Address,
    pub src_receiver: Address, // receives the source tokens before the swap is executed
    pub dst_receiver: Address, // receives the destination tokens
    pub amount: i128,
    pub min_return_amount: i128,
}

/// A caller supplied route for one swap leg
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct SwapRoute {
    pub executor: Address,
    pub desc: SwapDescription,
    pub data: Bytes,
}

#[allow(dead_code)]
#[contractclient(name = "ExchangeClient")]
pub trait Exchange {
    /// Swap the source tokens already sent to `desc.src_receiver` and deliver the
    /// destination tokens to `desc.dst_receiver`
    ///
    /// Returns the amount of destination tokens delivered
    fn swap(e: Env, executor: Address, desc: SwapDescription, data: Bytes) -> i128;
}
