//! Deterministic reference-pool address derivation
//!
//! The pool holding a token pair's reserves is found without any external
//! lookup: its address is a fixed hash of the factory, the ordered pair,
//! and the pool contract's init-code hash. Only reading the reserves
//! touches external state.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use tideclear_crypto::keccak256_all;

/// Immutable deployment constants for pool derivation, set once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRegistry {
    /// Factory that deployed every reference pool
    pub factory: Address,
    /// Hash of the pool contract's init code
    pub init_code_hash: B256,
}

impl PoolRegistry {
    pub fn new(factory: Address, init_code_hash: B256) -> Self {
        Self {
            factory,
            init_code_hash,
        }
    }

    /// Address of the pool for a token pair.
    ///
    /// The tokens are ordered ascending internally; callers may pass the
    /// pair either way round.
    pub fn pair_address(&self, a: Address, b: Address) -> Address {
        pair_address(self.factory, self.init_code_hash, a, b)
    }
}

/// keccak256(0xff ‖ factory ‖ keccak256(token0 ‖ token1) ‖ initCodeHash),
/// taken as an address. token0 < token1 ascending, or the derivation
/// would be invalid.
pub fn pair_address(factory: Address, init_code_hash: B256, a: Address, b: Address) -> Address {
    let (token0, token1) = if a < b { (a, b) } else { (b, a) };
    let pair_hash = keccak256_all(&[token0.as_slice(), token1.as_slice()]);
    let raw = keccak256_all(&[
        &[0xff],
        factory.as_slice(),
        pair_hash.as_slice(),
        init_code_hash.as_slice(),
    ]);
    Address::from_slice(&raw[12..])
}
