//! Interaction execution
//!
//! Interactions run between the pull phase and clearing, against
//! arbitrary external targets: liquidity sourcing, price discovery,
//! whatever the operator encoded. Two rules hold:
//!
//! 1. The custody account is denylisted as a target. Everything else the
//!    engine tolerates; the fee/price checks downstream are the actual
//!    safety backstop.
//! 2. A failed invocation does not abort the batch unless the deployment
//!    requires success; probes are best-effort by default.
//!
//! The executor also watches custody balances across each invocation:
//! per-interaction deltas become [`RealizedSwap`] records for the price
//! verifier, and the phase-wide net outflow per token feeds the final
//! fee reconciliation as "negative fee".

use crate::ledger::ValueStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tideclear_types::{Address, Interaction, RealizedSwap, Result, SettlementError, U256};
use tracing::{debug, warn};

/// External invocation seam
#[async_trait]
pub trait Interactor: Send + Sync {
    /// Invoke `target` with `payload`
    async fn call(&self, target: Address, payload: &[u8]) -> Result<()>;
}

/// What the interaction phase did, as observed from custody balances
#[derive(Debug, Default)]
pub struct InteractionOutcome {
    /// Interactions actually invoked
    pub executed: usize,
    /// Per-interaction one-in/one-out balance movements
    pub swaps: Vec<RealizedSwap>,
    /// Net custody outflow per token across the whole phase
    pub negative_fee: HashMap<Address, U256>,
}

/// Executes decoded interactions under the custody denylist
pub struct InteractionExecutor {
    custody: Address,
    require_success: bool,
}

impl InteractionExecutor {
    pub fn new(custody: Address, require_success: bool) -> Self {
        Self {
            custody,
            require_success,
        }
    }

    pub async fn execute(
        &self,
        interactions: &[Interaction],
        tokens: &[Address],
        store: &dyn ValueStore,
        interactor: &dyn Interactor,
    ) -> Result<InteractionOutcome> {
        let mut outcome = InteractionOutcome::default();
        if interactions.is_empty() {
            return Ok(outcome);
        }

        let phase_start = self.snapshot(tokens, store).await?;
        let mut before = phase_start.clone();

        for (index, interaction) in interactions.iter().enumerate() {
            if interaction.target == self.custody {
                return Err(SettlementError::ForbiddenTarget {
                    index,
                    target: interaction.target,
                });
            }

            match interactor.call(interaction.target, &interaction.payload).await {
                Ok(()) => {}
                Err(err) if self.require_success => return Err(err),
                Err(err) => {
                    warn!(index, target = %interaction.target, %err, "interaction failed, tolerated");
                    continue;
                }
            }
            outcome.executed += 1;

            let after = self.snapshot(tokens, store).await?;
            if let Some(swap) = observe_swap(tokens, &before, &after) {
                debug!(
                    token_out = %swap.token_out,
                    token_in = %swap.token_in,
                    "interaction realized a swap"
                );
                outcome.swaps.push(swap);
            }
            before = after;
        }

        // `before` now holds the phase-end snapshot
        for (i, token) in tokens.iter().enumerate() {
            if phase_start[i] > before[i] {
                outcome
                    .negative_fee
                    .insert(*token, phase_start[i] - before[i]);
            }
        }
        Ok(outcome)
    }

    async fn snapshot(&self, tokens: &[Address], store: &dyn ValueStore) -> Result<Vec<U256>> {
        let mut balances = Vec::with_capacity(tokens.len());
        for token in tokens {
            balances.push(store.balance_of(*token, self.custody).await?);
        }
        Ok(balances)
    }
}

/// A movement with exactly one token down and one up reads as a swap
fn observe_swap(tokens: &[Address], before: &[U256], after: &[U256]) -> Option<RealizedSwap> {
    let mut decreased = None;
    let mut increased = None;
    for (i, token) in tokens.iter().enumerate() {
        if after[i] < before[i] {
            if decreased.is_some() {
                return None;
            }
            decreased = Some((*token, before[i] - after[i]));
        } else if after[i] > before[i] {
            if increased.is_some() {
                return None;
            }
            increased = Some((*token, after[i] - before[i]));
        }
    }
    let (token_out, amount_out) = decreased?;
    let (token_in, amount_in) = increased?;
    Some(RealizedSwap {
        token_out,
        amount_out,
        token_in,
        amount_in,
    })
}
