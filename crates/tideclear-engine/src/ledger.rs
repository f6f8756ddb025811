//! Value-store seam and transfer journal
//!
//! The engine never owns balances; it moves value through the
//! [`ValueStore`] interface of the assets being traded. The
//! [`TransferJournal`] records every transfer the engine applies so a
//! failing batch can be unwound with compensating transfers. The
//! hosting environment's all-or-nothing execution is the outer guarantee,
//! the journal keeps the in-memory picture consistent with it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tideclear_types::{Address, Result, SettlementError, U256};
use tokio::sync::RwLock;
use tracing::{error, warn};

/// Fungible-value-store interface per token
#[async_trait]
pub trait ValueStore: Send + Sync {
    /// Current balance of `holder` for `token`
    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256>;

    /// Move `amount` of `token` from `from` to `to`
    async fn transfer(&self, token: Address, from: Address, to: Address, amount: U256)
        -> Result<()>;
}

/// One applied transfer, as remembered for unwinding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedTransfer {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

/// Append-only record of the engine's own transfers within one batch
#[derive(Debug, Default)]
pub struct TransferJournal {
    applied: Vec<AppliedTransfer>,
}

impl TransferJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transfers applied so far
    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Apply a transfer through the store and remember it
    pub async fn transfer(
        &mut self,
        store: &dyn ValueStore,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        store.transfer(token, from, to, amount).await?;
        self.applied.push(AppliedTransfer {
            token,
            from,
            to,
            amount,
        });
        Ok(())
    }

    /// Undo every applied transfer, most recent first.
    ///
    /// Unwinding is best-effort per entry: a compensating transfer that
    /// itself fails is logged and skipped, matching the hosting
    /// environment's own rollback being the authoritative one.
    pub async fn unwind(self, store: &dyn ValueStore) {
        for entry in self.applied.into_iter().rev() {
            if let Err(err) = store
                .transfer(entry.token, entry.to, entry.from, entry.amount)
                .await
            {
                error!(
                    token = %entry.token,
                    amount = %entry.amount,
                    %err,
                    "compensating transfer failed during unwind"
                );
            }
        }
    }
}

/// In-memory value store for tests and local simulation
///
/// Thread-safe; balances keyed by (token, holder).
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    balances: Arc<RwLock<HashMap<(Address, Address), U256>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a balance
    pub async fn set_balance(&self, token: Address, holder: Address, amount: U256) {
        self.balances.write().await.insert((token, holder), amount);
    }
}

#[async_trait]
impl ValueStore for InMemoryLedger {
    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256> {
        Ok(self
            .balances
            .read()
            .await
            .get(&(token, holder))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let mut balances = self.balances.write().await;
        let from_balance = balances.get(&(token, from)).copied().unwrap_or(U256::ZERO);
        if from_balance < amount {
            warn!(%token, %from, %to, %amount, %from_balance, "transfer rejected");
            return Err(SettlementError::TransferFailed {
                token,
                from,
                to,
                amount,
                reason: format!("balance {from_balance} is insufficient"),
            });
        }
        balances.insert((token, from), from_balance - amount);
        let to_balance = balances.get(&(token, to)).copied().unwrap_or(U256::ZERO);
        balances.insert((token, to), to_balance + amount);
        Ok(())
    }
}
