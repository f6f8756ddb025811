//! Order digests and signature recovery
//!
//! Orders carry recoverable secp256k1 signatures. The signer is never
//! transmitted: verification *is* recovery, and the recovered address
//! becomes the order's owner. The digest covers every signed field plus
//! the replay domain; the operator-chosen executed amount is deliberately
//! outside it.

use crate::hash::{keccak256, ReplayDomain};
use crate::keys::SigningAccount;
use alloy_primitives::{Address, B256, U256};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use tideclear_types::{Order, OrderKind, OrderSignature};

/// Compute the canonical digest an order owner signs.
///
/// Layout: domain prefix (tag ‖ chain id ‖ contract) ‖ sellAmount(32) ‖
/// buyAmount(32) ‖ sellToken(20) ‖ buyToken(20) ‖ tip(32) ‖ validTo(4) ‖
/// nonce(4) ‖ kind discriminant (absent for sell orders).
#[allow(clippy::too_many_arguments)]
pub fn order_digest(
    domain: &ReplayDomain,
    sell_amount: U256,
    buy_amount: U256,
    sell_token: Address,
    buy_token: Address,
    tip: U256,
    valid_to: u32,
    nonce: u32,
    kind: OrderKind,
) -> B256 {
    let mut buf = Vec::with_capacity(84 + 145);
    buf.extend_from_slice(&domain.prefix_bytes());
    buf.extend_from_slice(&sell_amount.to_be_bytes::<32>());
    buf.extend_from_slice(&buy_amount.to_be_bytes::<32>());
    buf.extend_from_slice(sell_token.as_slice());
    buf.extend_from_slice(buy_token.as_slice());
    buf.extend_from_slice(&tip.to_be_bytes::<32>());
    buf.extend_from_slice(&valid_to.to_be_bytes());
    buf.extend_from_slice(&nonce.to_be_bytes());
    if let Some(discriminant) = kind.digest_discriminant() {
        buf.push(discriminant);
    }
    keccak256(&buf)
}

/// Digest of an already-decoded order
pub fn digest_of(domain: &ReplayDomain, order: &Order) -> B256 {
    order_digest(
        domain,
        order.sell_amount,
        order.buy_amount,
        order.sell_token,
        order.buy_token,
        order.tip,
        order.valid_to,
        order.nonce,
        order.kind,
    )
}

/// Recover the signer of `digest` from a recoverable signature.
///
/// Returns `None` when the signature is not recoverable or recovery
/// yields the zero identity; callers treat both as an invalid signature.
pub fn recover_signer(digest: B256, signature: &OrderSignature) -> Option<Address> {
    let recovery_id = signature.v.checked_sub(27).and_then(RecoveryId::from_byte)?;
    let sig = EcdsaSignature::from_scalars(signature.r.0, signature.s.0).ok()?;
    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id).ok()?;

    let address = address_of_key(&key);
    if address == Address::ZERO {
        return None;
    }
    Some(address)
}

/// Recover the owner of a parsed order record
#[allow(clippy::too_many_arguments)]
pub fn recover_order_owner(
    domain: &ReplayDomain,
    sell_amount: U256,
    buy_amount: U256,
    sell_token: Address,
    buy_token: Address,
    tip: U256,
    valid_to: u32,
    nonce: u32,
    kind: OrderKind,
    signature: &OrderSignature,
) -> Option<Address> {
    let digest = order_digest(
        domain,
        sell_amount,
        buy_amount,
        sell_token,
        buy_token,
        tip,
        valid_to,
        nonce,
        kind,
    );
    recover_signer(digest, signature)
}

/// Sign a digest with a local account, producing the wire signature
pub fn sign_digest(account: &SigningAccount, digest: B256) -> OrderSignature {
    let (sig, recovery_id) = account
        .signing_key()
        .sign_prehash_recoverable(digest.as_slice())
        .expect("prehash signing over a 32-byte digest cannot fail");

    let r: [u8; 32] = sig.r().to_bytes().into();
    let s: [u8; 32] = sig.s().to_bytes().into();
    OrderSignature {
        v: 27 + recovery_id.to_byte(),
        r: B256::from(r),
        s: B256::from(s),
    }
}

/// Ethereum-style address of a verifying key: last 20 bytes of the
/// keccak-256 of the uncompressed public key
pub(crate) fn address_of_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
