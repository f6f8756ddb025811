//! Per-order settlement computation
//!
//! Given the uniform clearing prices and the batch fee factor F, each
//! order converts `executed_amount` of its sell token into the buy token
//! at the clearing ratio, with 1/F of the executed amount retained as
//! protocol fee. All divisions floor, so remainders always round in the
//! operator's favor and the remainder law
//! `fee == executed - sold` holds exactly.

use serde::{Deserialize, Serialize};
use tideclear_types::{Order, OrderKind, Result, SettlementError, U256};

/// Amounts computed for one order at clearing time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExecution {
    /// Sell-token amount actually converted, net of fee
    pub sold_amount: U256,
    /// Buy-token amount owed to the owner
    pub received_amount: U256,
    /// Sell-token amount retained as protocol fee
    pub fee_amount: U256,
}

/// Compute one order's settlement amounts under the fee schedule.
///
/// `price_sell`/`price_buy` are the clearing prices of the order's sell
/// and buy tokens; `fee_factor` below the protocol minimum is refused
/// here as well as at the call surface.
pub fn compute_execution(
    order: &Order,
    price_sell: U256,
    price_buy: U256,
    fee_factor: u64,
) -> Result<OrderExecution> {
    if fee_factor < crate::MIN_FEE_FACTOR {
        return Err(SettlementError::FeeFactorTooLow {
            fee_factor,
            minimum: crate::MIN_FEE_FACTOR,
        });
    }
    let executed = order.executed_amount;
    let factor = U256::from(fee_factor);
    let factor_less_one = U256::from(fee_factor - 1);

    // Fill bounds: a sell-side order can never spend beyond its signed
    // sell amount; kill-or-fill additionally demands the full amount.
    match order.kind {
        OrderKind::Sell | OrderKind::KillOrFill => {
            if executed > order.sell_amount {
                return Err(SettlementError::OverFill {
                    owner: order.owner,
                    executed,
                    limit: order.sell_amount,
                });
            }
        }
        OrderKind::Buy => {}
    }
    if order.kind == OrderKind::KillOrFill && executed != order.sell_amount {
        return Err(SettlementError::PartialFillNotAllowed { owner: order.owner });
    }

    // Limit-price check, cross-multiplied: the payout below can only be
    // at or above the signed sellAmount -> buyAmount rate.
    let lhs = checked_mul(checked_mul(price_sell, order.sell_amount)?, factor_less_one)?;
    let rhs = checked_mul(checked_mul(price_buy, order.buy_amount)?, factor)?;
    if lhs < rhs {
        return Err(SettlementError::LimitPriceNotMet { owner: order.owner });
    }

    if price_buy.is_zero() {
        return Err(SettlementError::PriceRejected {
            sell_token: order.sell_token,
            buy_token: order.buy_token,
        });
    }

    let sold_amount = checked_mul(executed, factor_less_one)? / factor;
    let received_amount = checked_mul(sold_amount, price_sell)? / price_buy;
    let fee_amount = executed - sold_amount;

    if order.kind == OrderKind::Buy && received_amount > order.buy_amount {
        return Err(SettlementError::OverFill {
            owner: order.owner,
            executed: received_amount,
            limit: order.buy_amount,
        });
    }

    Ok(OrderExecution {
        sold_amount,
        received_amount,
        fee_amount,
    })
}

/// Expiry check against the batch timestamp
pub fn check_not_expired(order: &Order, batch_time: u32) -> Result<()> {
    if order.valid_to < batch_time {
        return Err(SettlementError::OrderExpired {
            owner: order.owner,
            valid_to: order.valid_to,
            batch_time,
        });
    }
    Ok(())
}

fn checked_mul(a: U256, b: U256) -> Result<U256> {
    a.checked_mul(b).ok_or(SettlementError::AmountOverflow)
}
