//! Token-index resolution
//!
//! Clearing prices are supplied as a vector parallel to the settlement's
//! sorted token list; resolving a token to its index is a binary search.
//!
//! # Precondition
//!
//! The token list must be strictly ascending with no duplicates for the
//! entire settlement call. This is a deliberate performance/trust
//! trade-off: callers guarantee sortedness once upstream instead of the
//! engine paying an O(n log n) validation pass, and lookups stay
//! O(log n). A violated precondition silently breaks lookups; it is
//! never re-checked here.

use crate::{Result, SettlementError};
use alloy_primitives::Address;

/// Resolve `token` to its position in `sorted_tokens`.
///
/// Fails with [`SettlementError::TokenNotFound`] if the token is absent.
pub fn token_index(token: Address, sorted_tokens: &[Address]) -> Result<usize> {
    sorted_tokens
        .binary_search(&token)
        .map_err(|_| SettlementError::TokenNotFound { token })
}
