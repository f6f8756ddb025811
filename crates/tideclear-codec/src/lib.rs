//! Tideclear Codec - Byte-level order and interaction records
//!
//! Orders travel as fixed-stride records (simple, inflexible);
//! interactions as length-prefixed variable records (flexible, cursor
//! bookkeeping). Both decoders fail closed: any underrun or leftover
//! byte is a malformed-input error, never a silent truncation.

pub mod cursor;
pub mod interactions;
pub mod orders;

pub use cursor::ByteReader;
pub use interactions::{decode_interactions, encode_interaction, encode_interactions};
pub use orders::{decode_orders, encode_order, encode_orders, ORDER_STRIDE};
