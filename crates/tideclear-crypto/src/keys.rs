//! Local signing accounts
//!
//! Used by order-producing clients and by tests; the settlement engine
//! itself only ever recovers signers, it never holds keys.

use crate::signature::address_of_key;
use alloy_primitives::Address;
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;

/// A locally held secp256k1 account
#[derive(Clone)]
pub struct SigningAccount {
    signing_key: SigningKey,
}

impl SigningAccount {
    /// Generate a new random account
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Create from existing secret key bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        SigningKey::from_bytes(bytes.into())
            .ok()
            .map(|signing_key| Self { signing_key })
    }

    /// The account's address (derived from the public key)
    pub fn address(&self) -> Address {
        address_of_key(self.signing_key.verifying_key())
    }

    /// Get the signing key (private - never expose!)
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl std::fmt::Debug for SigningAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secret material stays out of logs
        f.debug_struct("SigningAccount")
            .field("address", &self.address())
            .finish()
    }
}
