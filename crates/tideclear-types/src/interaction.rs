//! Interaction types
//!
//! An interaction is an instruction to invoke an external target with an
//! arbitrary payload, used for liquidity sourcing or price discovery
//! during settlement. The one hard rule: the target must never be the
//! custody account, or a malicious interaction could drain escrowed
//! trader funds through the one account the engine implicitly trusts.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// An external invocation executed between the pull and clearing phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// Account to invoke
    pub target: Address,
    /// Opaque payload handed to the target
    pub payload: Vec<u8>,
}

/// Observed effect of one executed interaction on custody balances
///
/// Produced by the interaction executor when exactly one settlement token
/// decreased and one increased across the invocation; consumed by the
/// reference-pool price verifier as a realized trade price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedSwap {
    /// Token custody paid out
    pub token_out: Address,
    /// Amount of `token_out` paid
    pub amount_out: U256,
    /// Token custody received
    pub token_in: Address,
    /// Amount of `token_in` received
    pub amount_in: U256,
}

impl RealizedSwap {
    /// Whether this swap traded the given pair, in either direction
    pub fn matches_pair(&self, a: Address, b: Address) -> bool {
        (self.token_out == a && self.token_in == b)
            || (self.token_out == b && self.token_in == a)
    }
}
