//! Length-prefixed interaction records
//!
//! Layout per record:
//!
//! ```text
//! length(2, big-endian payload size) ‖ target(20) ‖ payload(length)
//! ```
//!
//! The record count travels separately; the stream must contain exactly
//! `count` records with nothing left over.

use crate::cursor::ByteReader;
use tideclear_types::{Interaction, Result, SettlementError};

/// Decode exactly `count` interaction records.
///
/// Fails with MalformedInput if the stream is exhausted before `count`
/// records are parsed or bytes remain afterwards.
pub fn decode_interactions(bytes: &[u8], count: usize) -> Result<Vec<Interaction>> {
    let mut reader = ByteReader::new(bytes);
    let mut interactions = Vec::with_capacity(count);

    for _ in 0..count {
        let length = reader.u16_be()? as usize;
        let target = reader.address()?;
        let payload = reader.take(length)?.to_vec();
        interactions.push(Interaction { target, payload });
    }

    if !reader.is_exhausted() {
        return Err(SettlementError::MalformedInput {
            reason: format!(
                "{} bytes remain after {count} interaction records",
                reader.remaining()
            ),
        });
    }
    Ok(interactions)
}

/// Encode one interaction record
pub fn encode_interaction(interaction: &Interaction) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + 20 + interaction.payload.len());
    out.extend_from_slice(&(interaction.payload.len() as u16).to_be_bytes());
    out.extend_from_slice(interaction.target.as_slice());
    out.extend_from_slice(&interaction.payload);
    out
}

/// Encode a batch of interactions into one contiguous byte stream
pub fn encode_interactions(interactions: &[Interaction]) -> Vec<u8> {
    let mut out = Vec::new();
    for interaction in interactions {
        out.extend_from_slice(&encode_interaction(interaction));
    }
    out
}
