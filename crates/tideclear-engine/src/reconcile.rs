//! Fee/balance reconciliation
//!
//! The closing invariant of every batch: for each settlement token, the
//! custody account must hold at least what it held before the batch plus
//! every fee it claims to have collected, net of value knowingly consumed
//! by interactions. The protocol operator can never extract more value
//! from traders than the declared fee.

use std::collections::HashMap;
use tideclear_types::{Address, Result, SettlementError, U256};
use tracing::debug;

/// Balances of one token at the reconciliation points
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenReconciliation {
    /// Custody balance before any pull
    pub initial: U256,
    /// Custody balance after all settlement transfers
    pub r#final: U256,
    /// Fee the clearing engine accounted for this token
    pub collected: U256,
    /// Value consumed by interactions (net phase outflow)
    pub negative_fee: U256,
}

impl TokenReconciliation {
    /// final + negativeFee >= initial + collected, additions checked
    pub fn check(&self, token: Address) -> Result<()> {
        let holding = self
            .r#final
            .checked_add(self.negative_fee)
            .ok_or(SettlementError::AmountOverflow)?;
        let required = self
            .initial
            .checked_add(self.collected)
            .ok_or(SettlementError::AmountOverflow)?;
        if holding < required {
            return Err(SettlementError::InsufficientFeeCollected {
                token,
                required,
                holding,
            });
        }
        debug!(%token, %holding, %required, "token reconciled");
        Ok(())
    }
}

/// Check every settlement token's reconciliation
pub fn reconcile_all(
    tokens: &[Address],
    reconciliations: &HashMap<Address, TokenReconciliation>,
) -> Result<()> {
    for token in tokens {
        if let Some(entry) = reconciliations.get(token) {
            entry.check(*token)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_exact_boundary_passes() {
        let entry = TokenReconciliation {
            initial: U256::from(50u64),
            r#final: U256::from(60u64),
            collected: U256::from(10u64),
            negative_fee: U256::ZERO,
        };
        entry.check(addr(0x01)).unwrap();
    }

    #[test]
    fn test_one_unit_short_fails() {
        let entry = TokenReconciliation {
            initial: U256::from(50u64),
            r#final: U256::from(59u64),
            collected: U256::from(10u64),
            negative_fee: U256::ZERO,
        };
        let err = entry.check(addr(0x01)).unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_FEE_COLLECTED");
    }

    #[test]
    fn test_negative_fee_excuses_interaction_outflow() {
        // Interactions consumed 5; the engine knew and accounted for it
        let entry = TokenReconciliation {
            initial: U256::from(50u64),
            r#final: U256::from(55u64),
            collected: U256::from(10u64),
            negative_fee: U256::from(5u64),
        };
        entry.check(addr(0x01)).unwrap();
    }

    #[test]
    fn test_surplus_passes() {
        let entry = TokenReconciliation {
            initial: U256::ZERO,
            r#final: U256::from(1_000u64),
            collected: U256::from(10u64),
            negative_fee: U256::ZERO,
        };
        entry.check(addr(0x01)).unwrap();
    }
}
