//! Tideclear Engine - Atomic batch settlement execution
//!
//! One `settle` call is one indivisible unit of execution: decode the
//! signed orders, pull each order's executed sell amount into custody,
//! run the operator's liquidity-sourcing interactions, verify the claimed
//! clearing prices, pay every order out at those prices net of fee, and
//! finally prove the engine ended no poorer than it started plus declared
//! fees. Any failure at any stage aborts the entire batch; the transfer
//! journal unwinds whatever had already been applied.
//!
//! The engine holds no balances and no keys. It trusts exactly one
//! account, custody, and the single hard denylist rule plus the
//! reentrancy guard protect that trust.

pub mod clearing;
pub mod executor;
pub mod ledger;
pub mod reconcile;

pub use clearing::{check_not_expired, compute_execution, OrderExecution};
pub use executor::{InteractionExecutor, InteractionOutcome, Interactor};
pub use ledger::{AppliedTransfer, InMemoryLedger, TransferJournal, ValueStore};
pub use reconcile::{reconcile_all, TokenReconciliation};

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tideclear_codec::{decode_interactions, decode_orders};
use tideclear_crypto::ReplayDomain;
use tideclear_pricing::{PriceContext, PriceVerifier};
use tideclear_types::{token_index, Address, Order, OrderKind, Result, SettlementError, U256};
use tracing::{info, warn};
use uuid::Uuid;

/// Protocol floor for the fee factor (1/100 = at most a 1% fee)
pub const MIN_FEE_FACTOR: u64 = 100;

/// Permissioning seam: which callers may submit a settlement
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, caller: Address) -> bool;
}

/// Static operator allow-list
#[derive(Debug, Clone, Default)]
pub struct OperatorAllowList {
    operators: HashSet<Address>,
}

impl OperatorAllowList {
    pub fn new(operators: impl IntoIterator<Item = Address>) -> Self {
        Self {
            operators: operators.into_iter().collect(),
        }
    }
}

impl Authorizer for OperatorAllowList {
    fn is_authorized(&self, caller: Address) -> bool {
        self.operators.contains(&caller)
    }
}

/// Immutable engine configuration, set once at construction
#[derive(Debug, Clone)]
pub struct SettlementConfig {
    /// Replay-protection domain every order signature is bound to
    pub domain: ReplayDomain,
    /// The custody account holding traders' funds in escrow
    pub custody: Address,
    /// Fee-factor floor; never below [`MIN_FEE_FACTOR`]
    pub min_fee_factor: u64,
    /// Abort the batch when an interaction invocation fails
    pub require_interaction_success: bool,
}

impl SettlementConfig {
    pub fn new(domain: ReplayDomain, custody: Address) -> Self {
        Self {
            domain,
            custody,
            min_fee_factor: MIN_FEE_FACTOR,
            require_interaction_success: false,
        }
    }
}

/// Parameters of one settlement call
#[derive(Debug, Clone)]
pub struct SettlementInput<'a> {
    /// Fixed-stride signed order records
    pub encoded_orders: &'a [u8],
    /// One kind per order record
    pub order_kinds: &'a [OrderKind],
    /// Length-prefixed interaction records
    pub encoded_interactions: &'a [u8],
    /// Number of interaction records in the stream
    pub interaction_count: usize,
    /// Claimed clearing prices, parallel to `tokens`
    pub clearing_prices: &'a [U256],
    /// Settlement token list.
    ///
    /// Precondition: strictly ascending, duplicate-free. This is never
    /// re-validated; token lookups binary-search it directly.
    pub tokens: &'a [Address],
    /// Fee factor F: 1/F of each executed amount is retained as fee
    pub fee_factor: u64,
    /// Batch timestamp orders are expired against
    pub batch_time: u32,
}

/// One order's outcome in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettledOrder {
    pub owner: Address,
    pub sell_token: Address,
    pub buy_token: Address,
    pub executed_amount: U256,
    pub sold_amount: U256,
    pub received_amount: U256,
    pub fee_amount: U256,
}

/// Outcome of a successful settlement call
#[derive(Debug, Clone)]
pub struct SettlementReport {
    pub batch_id: Uuid,
    pub settled_at: DateTime<Utc>,
    pub orders_settled: usize,
    pub interactions_executed: usize,
    /// Fee retained in custody, per sell token
    pub collected_fees: HashMap<Address, U256>,
    pub executions: Vec<SettledOrder>,
}

/// The batch settlement engine
pub struct Settlement {
    config: SettlementConfig,
    authorizer: Arc<dyn Authorizer>,
    store: Arc<dyn ValueStore>,
    interactor: Arc<dyn Interactor>,
    verifier: Arc<dyn PriceVerifier>,
    in_flight: AtomicBool,
}

impl Settlement {
    pub fn new(
        config: SettlementConfig,
        authorizer: Arc<dyn Authorizer>,
        store: Arc<dyn ValueStore>,
        interactor: Arc<dyn Interactor>,
        verifier: Arc<dyn PriceVerifier>,
    ) -> Self {
        Self {
            config,
            authorizer,
            store,
            interactor,
            verifier,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Execute one settlement batch atomically.
    ///
    /// On error, every transfer the engine had applied is unwound before
    /// the error is returned: the caller observes the call as entirely
    /// reverted, even though sub-steps may have executed internally
    /// before the failing check.
    pub async fn settle(
        &self,
        caller: Address,
        input: SettlementInput<'_>,
    ) -> Result<SettlementReport> {
        let _guard = ReentrancyGuard::acquire(&self.in_flight)?;

        if !self.authorizer.is_authorized(caller) {
            return Err(SettlementError::Unauthorized { caller });
        }
        if input.fee_factor < self.config.min_fee_factor {
            return Err(SettlementError::FeeFactorTooLow {
                fee_factor: input.fee_factor,
                minimum: self.config.min_fee_factor,
            });
        }
        if input.clearing_prices.len() != input.tokens.len() {
            return Err(SettlementError::MalformedInput {
                reason: format!(
                    "{} clearing prices for {} tokens",
                    input.clearing_prices.len(),
                    input.tokens.len()
                ),
            });
        }

        let orders = decode_orders(input.encoded_orders, input.order_kinds, &self.config.domain)?;
        for order in &orders {
            check_not_expired(order, input.batch_time)?;
        }

        let batch_id = Uuid::new_v4();
        info!(
            %batch_id,
            orders = orders.len(),
            tokens = input.tokens.len(),
            fee_factor = input.fee_factor,
            "settlement batch started"
        );

        let mut journal = TransferJournal::new();
        match self.run(batch_id, &orders, &input, &mut journal).await {
            Ok(report) => {
                info!(
                    %batch_id,
                    orders = report.orders_settled,
                    interactions = report.interactions_executed,
                    "settlement batch committed"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(%batch_id, %err, transfers = journal.len(), "settlement batch aborted, unwinding");
                journal.unwind(self.store.as_ref()).await;
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        batch_id: Uuid,
        orders: &[Order],
        input: &SettlementInput<'_>,
        journal: &mut TransferJournal,
    ) -> Result<SettlementReport> {
        let custody = self.config.custody;
        let store = self.store.as_ref();

        // Custody balances before any funds move
        let mut initial = Vec::with_capacity(input.tokens.len());
        for token in input.tokens {
            initial.push(store.balance_of(*token, custody).await?);
        }

        // Pull phase: each order's executed sell amount moves into escrow
        for order in orders {
            journal
                .transfer(
                    store,
                    order.sell_token,
                    order.owner,
                    custody,
                    order.executed_amount,
                )
                .await?;
        }

        // Liquidity sourcing / price discovery
        let interactions =
            decode_interactions(input.encoded_interactions, input.interaction_count)?;
        let executor =
            InteractionExecutor::new(custody, self.config.require_interaction_success);
        let outcome = executor
            .execute(&interactions, input.tokens, store, self.interactor.as_ref())
            .await?;

        // Claimed prices must clear an acceptance band before a single
        // order is paid out
        let pairs = distinct_pairs(orders);
        let ctx = PriceContext {
            tokens: input.tokens,
            clearing_prices: input.clearing_prices,
            fee_factor: input.fee_factor,
            pairs: &pairs,
            swaps: &outcome.swaps,
        };
        self.verifier.verify(&ctx).await?;

        // Clearing: compute and execute every order's settlement transfer
        let mut collected_fees: HashMap<Address, U256> = HashMap::new();
        let mut executions = Vec::with_capacity(orders.len());
        for order in orders {
            let price_sell = input.clearing_prices[token_index(order.sell_token, input.tokens)?];
            let price_buy = input.clearing_prices[token_index(order.buy_token, input.tokens)?];
            let exec = compute_execution(order, price_sell, price_buy, input.fee_factor)?;

            journal
                .transfer(store, order.buy_token, custody, order.owner, exec.received_amount)
                .await?;

            let fee_entry = collected_fees.entry(order.sell_token).or_insert(U256::ZERO);
            *fee_entry = fee_entry
                .checked_add(exec.fee_amount)
                .ok_or(SettlementError::AmountOverflow)?;

            executions.push(SettledOrder {
                owner: order.owner,
                sell_token: order.sell_token,
                buy_token: order.buy_token,
                executed_amount: order.executed_amount,
                sold_amount: exec.sold_amount,
                received_amount: exec.received_amount,
                fee_amount: exec.fee_amount,
            });
        }

        // Closing invariant: custody may not end poorer than it started
        // plus declared fees, net of interaction consumption
        let mut reconciliations = HashMap::new();
        for (i, token) in input.tokens.iter().enumerate() {
            let final_balance = store.balance_of(*token, custody).await?;
            reconciliations.insert(
                *token,
                TokenReconciliation {
                    initial: initial[i],
                    r#final: final_balance,
                    collected: collected_fees.get(token).copied().unwrap_or(U256::ZERO),
                    negative_fee: outcome.negative_fee.get(token).copied().unwrap_or(U256::ZERO),
                },
            );
        }
        reconcile_all(input.tokens, &reconciliations)?;

        Ok(SettlementReport {
            batch_id,
            settled_at: Utc::now(),
            orders_settled: orders.len(),
            interactions_executed: outcome.executed,
            collected_fees,
            executions,
        })
    }
}

/// Distinct (sell, buy) pairs in first-seen order
fn distinct_pairs(orders: &[Order]) -> Vec<(Address, Address)> {
    let mut pairs = Vec::new();
    for order in orders {
        let pair = order.token_pair();
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }
    pairs
}

/// Scoped acquisition of the settlement surface.
///
/// Set before dispatching any work, cleared on drop; a nested settle
/// invocation fails immediately instead of relying solely on the custody
/// denylist.
struct ReentrancyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ReentrancyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SettlementError::ReentrantSettlement);
        }
        Ok(Self { flag })
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
