//! Acceptance bands
//!
//! The original acceptance logic combined its two bands with an OR using
//! tolerance constants that do not obviously agree (997/1000 against the
//! reserve ratio, 997/1000 and 999/1000 against realized trades), which
//! likely admits a wider-than-intended deviation on one branch. Per the
//! system owner's instruction the literal bounds are implemented and
//! parameterized here rather than "corrected"; tightening them needs an
//! owner decision first.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tideclear_types::{Result, SettlementError};

/// Parameterized tolerance constants for [`ReferencePoolVerifier`]
///
/// [`ReferencePoolVerifier`]: crate::ReferencePoolVerifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToleranceBands {
    /// Reserve band half-width: claimed/fair must lie within
    /// [reserve_num/reserve_den, reserve_den/reserve_num]
    pub reserve_num: u64,
    pub reserve_den: u64,
    /// Tight side of the realized band: claimed/realized must not exceed
    /// realized_tight_den/realized_tight_num
    pub realized_tight_num: u64,
    pub realized_tight_den: u64,
    /// Loose side of the realized band: claimed/realized must be at least
    /// realized_loose_num/realized_loose_den
    pub realized_loose_num: u64,
    pub realized_loose_den: u64,
}

impl Default for ToleranceBands {
    /// The literal constants of the original acceptance logic
    fn default() -> Self {
        Self {
            reserve_num: 997,
            reserve_den: 1000,
            realized_tight_num: 999,
            realized_tight_den: 1000,
            realized_loose_num: 997,
            realized_loose_den: 1000,
        }
    }
}

/// Whether lhs/rhs lies within [lower_num/lower_den, upper_den/upper_num].
///
/// Pure integer cross-multiplication; overflow fails closed.
pub fn ratio_within(
    lhs: U256,
    rhs: U256,
    lower_num: u64,
    lower_den: u64,
    upper_num: u64,
    upper_den: u64,
) -> Result<bool> {
    let above_lower = mul(lhs, lower_den)? >= mul(rhs, lower_num)?;
    let below_upper = mul(lhs, upper_num)? <= mul(rhs, upper_den)?;
    Ok(above_lower && below_upper)
}

fn mul(a: U256, b: u64) -> Result<U256> {
    a.checked_mul(U256::from(b))
        .ok_or(SettlementError::AmountOverflow)
}
