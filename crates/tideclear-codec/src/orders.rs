//! Fixed-stride order records
//!
//! Layout (241 bytes per record, all integers big-endian):
//!
//! ```text
//! sellAmount(32) ‖ buyAmount(32) ‖ executedAmount(32) ‖ sellToken(20) ‖
//! buyToken(20) ‖ tip(32) ‖ validTo(4) ‖ nonce(4) ‖ v(1) ‖ r(32) ‖ s(32)
//! ```
//!
//! The record deliberately carries no owner and no order kind: the owner
//! is recovered from the signature, and the kind is supplied out of band
//! (one per record) and bound into the signed digest, so a misdeclared
//! kind changes the recovered owner instead of forging consent.

use crate::cursor::ByteReader;
use tideclear_crypto::{recover_order_owner, ReplayDomain};
use tideclear_types::{Order, OrderKind, OrderSignature, Result, SettlementError};

/// Fixed byte length of one encoded order record
pub const ORDER_STRIDE: usize = 241;

/// Decode a batch of fixed-stride order records, recovering each owner.
///
/// Fails with MalformedInput if the byte length is not an exact multiple
/// of the stride or `kinds` does not carry exactly one kind per record;
/// fails with InvalidSignature if any record's signature does not recover
/// to a non-zero identity.
pub fn decode_orders(bytes: &[u8], kinds: &[OrderKind], domain: &ReplayDomain) -> Result<Vec<Order>> {
    if bytes.len() % ORDER_STRIDE != 0 {
        return Err(SettlementError::MalformedInput {
            reason: format!(
                "order bytes length {} is not a multiple of the {ORDER_STRIDE}-byte stride",
                bytes.len()
            ),
        });
    }
    let count = bytes.len() / ORDER_STRIDE;
    if kinds.len() != count {
        return Err(SettlementError::MalformedInput {
            reason: format!("{count} order records but {} order kinds", kinds.len()),
        });
    }

    let mut reader = ByteReader::new(bytes);
    let mut orders = Vec::with_capacity(count);
    for (index, kind) in kinds.iter().copied().enumerate() {
        orders.push(decode_one(&mut reader, index, kind, domain)?);
    }
    Ok(orders)
}

fn decode_one(
    reader: &mut ByteReader<'_>,
    index: usize,
    kind: OrderKind,
    domain: &ReplayDomain,
) -> Result<Order> {
    let sell_amount = reader.u256()?;
    let buy_amount = reader.u256()?;
    let executed_amount = reader.u256()?;
    let sell_token = reader.address()?;
    let buy_token = reader.address()?;
    let tip = reader.u256()?;
    let valid_to = reader.u32_be()?;
    let nonce = reader.u32_be()?;
    let signature = OrderSignature {
        v: reader.byte()?,
        r: reader.b256()?,
        s: reader.b256()?,
    };

    let owner = recover_order_owner(
        domain,
        sell_amount,
        buy_amount,
        sell_token,
        buy_token,
        tip,
        valid_to,
        nonce,
        kind,
        &signature,
    )
    .ok_or(SettlementError::InvalidSignature { index })?;

    Ok(Order {
        sell_amount,
        buy_amount,
        executed_amount,
        sell_token,
        buy_token,
        tip,
        valid_to,
        nonce,
        kind,
        owner,
        signature,
    })
}

/// Encode one order back into its fixed-stride record
pub fn encode_order(order: &Order) -> [u8; ORDER_STRIDE] {
    let mut out = [0u8; ORDER_STRIDE];
    out[0..32].copy_from_slice(&order.sell_amount.to_be_bytes::<32>());
    out[32..64].copy_from_slice(&order.buy_amount.to_be_bytes::<32>());
    out[64..96].copy_from_slice(&order.executed_amount.to_be_bytes::<32>());
    out[96..116].copy_from_slice(order.sell_token.as_slice());
    out[116..136].copy_from_slice(order.buy_token.as_slice());
    out[136..168].copy_from_slice(&order.tip.to_be_bytes::<32>());
    out[168..172].copy_from_slice(&order.valid_to.to_be_bytes());
    out[172..176].copy_from_slice(&order.nonce.to_be_bytes());
    out[176] = order.signature.v;
    out[177..209].copy_from_slice(order.signature.r.as_slice());
    out[209..241].copy_from_slice(order.signature.s.as_slice());
    out
}

/// Encode a batch of orders into one contiguous byte stream
pub fn encode_orders(orders: &[Order]) -> Vec<u8> {
    let mut out = Vec::with_capacity(orders.len() * ORDER_STRIDE);
    for order in orders {
        out.extend_from_slice(&encode_order(order));
    }
    out
}
