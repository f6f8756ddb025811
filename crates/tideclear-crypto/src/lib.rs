//! Tideclear Crypto - Digests, replay domain, and signature recovery
//!
//! Every order digest is domain-separated: a protocol tag, the network
//! chain id, and the settlement engine's own address are mixed into the
//! hash, so a signature valid for one deployment can never be replayed
//! against another.

pub mod hash;
pub mod keys;
pub mod signature;

pub use hash::{keccak256, keccak256_all, ReplayDomain};
pub use keys::SigningAccount;
pub use signature::{digest_of, order_digest, recover_order_owner, recover_signer, sign_digest};
