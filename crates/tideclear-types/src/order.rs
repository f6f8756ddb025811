//! Order types
//!
//! An order is one trader's signed intent: sell up to `sell_amount` of
//! `sell_token` for at least the proportional share of `buy_amount` of
//! `buy_token`. The operator chooses `executed_amount` per batch; the
//! trader's signature covers everything else.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Fill semantics of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// Sell order, partially fillable
    Sell,
    /// Buy order, partially fillable up to its buy amount
    Buy,
    /// Must execute for the full sell amount or not at all
    KillOrFill,
}

impl OrderKind {
    /// Digest discriminant mixed into the signed digest for non-sell kinds.
    ///
    /// Sell orders append nothing, keeping their digest layout stable;
    /// Buy and KillOrFill orders append one byte so a signature over one
    /// kind can never be replayed as another.
    pub fn digest_discriminant(&self) -> Option<u8> {
        match self {
            Self::Sell => None,
            Self::Buy => Some(0x01),
            Self::KillOrFill => Some(0x02),
        }
    }
}

/// A recoverable secp256k1 signature as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSignature {
    /// Recovery byte (27 or 28)
    pub v: u8,
    /// First signature scalar
    pub r: B256,
    /// Second signature scalar
    pub s: B256,
}

/// One trader's signed intent, decoded from a fixed-stride record
///
/// `owner` is never transmitted: it is the address recovered from the
/// signature over the order's canonical digest, closing any spoofing
/// vector. The signature itself is retained so encoding round-trips the
/// original record byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Limit amount of `sell_token` the trader is willing to part with
    pub sell_amount: U256,
    /// Limit amount of `buy_token` the trader demands in exchange
    pub buy_amount: U256,
    /// Amount of `sell_token` the operator claims to fill this batch
    pub executed_amount: U256,
    /// Token being sold
    pub sell_token: Address,
    /// Token being bought
    pub buy_token: Address,
    /// Tip contributed towards the protocol fee, bound by the signature
    pub tip: U256,
    /// Expiry marker (seconds); the batch timestamp must not exceed it
    pub valid_to: u32,
    /// Replay-distinguishing value
    pub nonce: u32,
    /// Fill semantics
    pub kind: OrderKind,
    /// Recovered signer; the only trusted identity for this order
    pub owner: Address,
    /// Signature the owner was recovered from
    pub signature: OrderSignature,
}

impl Order {
    /// The distinct (sell, buy) pair this order trades
    pub fn token_pair(&self) -> (Address, Address) {
        (self.sell_token, self.buy_token)
    }
}
