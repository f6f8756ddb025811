//! Hashing utilities for Tideclear

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Compute the keccak-256 hash of data
pub fn keccak256(data: &[u8]) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    B256::from_slice(&hasher.finalize())
}

/// Compute the keccak-256 hash of multiple items
pub fn keccak256_all(items: &[&[u8]]) -> B256 {
    let mut hasher = Keccak256::new();
    for item in items {
        hasher.update(item);
    }
    B256::from_slice(&hasher.finalize())
}

/// Replay-protection domain, derived once at initialization
///
/// Immutable process-wide state: constructed exactly once and never
/// mutated thereafter. Mixed into every order digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayDomain {
    /// Hash of the protocol tag string
    pub tag: B256,
    /// Network/chain identifier
    pub chain_id: u64,
    /// The settlement engine's own address
    pub contract: Address,
}

impl ReplayDomain {
    /// The protocol tag all Tideclear deployments share
    pub const PROTOCOL_TAG: &'static str = "tideclear.settlement.v1";

    /// Derive the domain for one deployment
    pub fn new(chain_id: u64, contract: Address) -> Self {
        Self {
            tag: keccak256(Self::PROTOCOL_TAG.as_bytes()),
            chain_id,
            contract,
        }
    }

    /// The domain prefix bytes every order digest starts with:
    /// tag (32) ‖ chain id as 32-byte big-endian ‖ contract (20)
    pub fn prefix_bytes(&self) -> [u8; 84] {
        let mut out = [0u8; 84];
        out[..32].copy_from_slice(self.tag.as_slice());
        out[32..64].copy_from_slice(&U256::from(self.chain_id).to_be_bytes::<32>());
        out[64..84].copy_from_slice(self.contract.as_slice());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_known_vector() {
        // keccak256 of the empty string
        let hash = keccak256(b"");
        assert_eq!(
            hex::encode(hash),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_all_matches_concatenation() {
        let joined = keccak256(b"hello world");
        let parts = keccak256_all(&[b"hello", b" ", b"world"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_domains_differ_per_deployment() {
        let contract = Address::repeat_byte(0x42);
        let a = ReplayDomain::new(1, contract);
        let b = ReplayDomain::new(100, contract);
        let c = ReplayDomain::new(1, Address::repeat_byte(0x43));

        assert_ne!(a.prefix_bytes(), b.prefix_bytes());
        assert_ne!(a.prefix_bytes(), c.prefix_bytes());
    }
}
