//! Error types for Tideclear
//!
//! Every failure kind is fatal to the enclosing settlement call. There is
//! no partial success and no retry inside the engine; retries, if any,
//! belong to the caller issuing a new call.

use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Result type for Tideclear operations
pub type Result<T> = std::result::Result<T, SettlementError>;

/// Tideclear settlement error taxonomy
#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    // ========================================================================
    // Decoding Errors
    // ========================================================================

    /// Byte stream does not match the expected record layout
    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    /// Signature recovery failed or produced the zero identity
    #[error("invalid signature on order record {index}")]
    InvalidSignature { index: usize },

    // ========================================================================
    // Lookup Errors
    // ========================================================================

    /// Token is absent from the settlement token list
    #[error("token {token} not found in the settlement token list")]
    TokenNotFound { token: Address },

    // ========================================================================
    // Price & Clearing Errors
    // ========================================================================

    /// No acceptance band matched the claimed clearing price
    #[error("clearing price for pair {sell_token}/{buy_token} rejected")]
    PriceRejected {
        sell_token: Address,
        buy_token: Address,
    },

    /// Clearing price violates the order's signed limit
    #[error("limit price not met for order of {owner}")]
    LimitPriceNotMet { owner: Address },

    /// Kill-or-fill order executed for less than its full amount
    #[error("partial fill not allowed for kill-or-fill order of {owner}")]
    PartialFillNotAllowed { owner: Address },

    /// Order filled beyond its signed amount
    #[error("order of {owner} filled beyond its limit: {executed} > {limit}")]
    OverFill {
        owner: Address,
        executed: U256,
        limit: U256,
    },

    /// Order's expiry marker lies before the batch timestamp
    #[error("order of {owner} expired at {valid_to} (batch time {batch_time})")]
    OrderExpired {
        owner: Address,
        valid_to: u32,
        batch_time: u32,
    },

    /// Fee factor below the protocol minimum
    #[error("fee factor {fee_factor} below minimum {minimum}")]
    FeeFactorTooLow { fee_factor: u64, minimum: u64 },

    /// 256-bit arithmetic overflow during settlement computation
    #[error("amount overflow during settlement arithmetic")]
    AmountOverflow,

    // ========================================================================
    // Execution Errors
    // ========================================================================

    /// Interaction targets the custody account
    #[error("interaction {index} targets the custody account {target}")]
    ForbiddenTarget { index: usize, target: Address },

    /// Underlying value store rejected a transfer
    #[error("transfer of {amount} of token {token} from {from} to {to} failed: {reason}")]
    TransferFailed {
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
        reason: String,
    },

    /// Final reconciliation found the engine poorer than declared fees allow
    #[error(
        "insufficient fee collected for token {token}: required {required}, holding {holding}"
    )]
    InsufficientFeeCollected {
        token: Address,
        required: U256,
        holding: U256,
    },

    // ========================================================================
    // Call-Surface Errors
    // ========================================================================

    /// A settlement call re-entered while another was in progress
    #[error("settlement already in progress")]
    ReentrantSettlement,

    /// Caller is not a permitted settlement operator
    #[error("caller {caller} is not an authorized settlement operator")]
    Unauthorized { caller: Address },
}

impl SettlementError {
    /// Create a malformed-input error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }

    /// Get an error code for machine-readable classification
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedInput { .. } => "MALFORMED_INPUT",
            Self::InvalidSignature { .. } => "INVALID_SIGNATURE",
            Self::TokenNotFound { .. } => "TOKEN_NOT_FOUND",
            Self::PriceRejected { .. } => "PRICE_REJECTED",
            Self::LimitPriceNotMet { .. } => "LIMIT_PRICE_NOT_MET",
            Self::PartialFillNotAllowed { .. } => "PARTIAL_FILL_NOT_ALLOWED",
            Self::OverFill { .. } => "OVER_FILL",
            Self::OrderExpired { .. } => "ORDER_EXPIRED",
            Self::FeeFactorTooLow { .. } => "FEE_FACTOR_TOO_LOW",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::ForbiddenTarget { .. } => "FORBIDDEN_TARGET",
            Self::TransferFailed { .. } => "TRANSFER_FAILED",
            Self::InsufficientFeeCollected { .. } => "INSUFFICIENT_FEE_COLLECTED",
            Self::ReentrantSettlement => "REENTRANT_SETTLEMENT",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SettlementError::FeeFactorTooLow {
            fee_factor: 10,
            minimum: 100,
        };
        assert_eq!(err.error_code(), "FEE_FACTOR_TOO_LOW");

        let err = SettlementError::malformed("order bytes not a stride multiple");
        assert_eq!(err.error_code(), "MALFORMED_INPUT");
    }

    #[test]
    fn test_display_carries_context() {
        let err = SettlementError::InsufficientFeeCollected {
            token: Address::repeat_byte(0x11),
            required: U256::from(100u64),
            holding: U256::from(99u64),
        };
        let text = err.to_string();
        assert!(text.contains("100"));
        assert!(text.contains("99"));
    }
}
