//! Tideclear Pricing - Pluggable clearing-price verification
//!
//! Two interchangeable strategies, selected per deployment:
//!
//! - [`ReferencePoolVerifier`] checks every traded pair's claimed price
//!   against an external liquidity pool's reserve ratio, falling back to
//!   the price realized by matching executed interactions when the pool
//!   is thin.
//! - [`FeeFactorVerifier`] delegates price safety entirely to the
//!   per-order limit checks in the clearing engine and only enforces the
//!   fee-factor floor and price positivity. Used when liquidity sourcing
//!   is delegated to arbitrary interactions rather than one known pool.
//!
//! Either way, rejection aborts the whole batch with PriceRejected.

pub mod bands;
pub mod pool;

pub use bands::ToleranceBands;
pub use pool::{pair_address, PoolRegistry};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use tideclear_types::{token_index, RealizedSwap, Result, SettlementError};
use tracing::{debug, warn};

/// Everything a strategy may consult when judging claimed prices
pub struct PriceContext<'a> {
    /// Sorted settlement token list
    pub tokens: &'a [Address],
    /// Claimed clearing prices, parallel to `tokens`
    pub clearing_prices: &'a [U256],
    /// Fee factor for this batch
    pub fee_factor: u64,
    /// Distinct (sell, buy) pairs traded by the batch's orders
    pub pairs: &'a [(Address, Address)],
    /// Realized amounts of executed interactions
    pub swaps: &'a [RealizedSwap],
}

impl PriceContext<'_> {
    /// Claimed price of a token
    pub fn price_of(&self, token: Address) -> Result<U256> {
        let index = token_index(token, self.tokens)?;
        Ok(self.clearing_prices[index])
    }
}

/// Capability: accept or reject the batch's claimed clearing prices
#[async_trait]
pub trait PriceVerifier: Send + Sync {
    async fn verify(&self, ctx: &PriceContext<'_>) -> Result<()>;
}

/// Source of a reference pool's reserves
#[async_trait]
pub trait ReserveSource: Send + Sync {
    /// Reserves of the pool account, in (token0, token1) order,
    /// token0/token1 being the pair's tokens sorted ascending
    async fn reserves(&self, pool: Address) -> Result<(U256, U256)>;
}

/// Reference-pool strategy: reserve band OR realized-interaction band
pub struct ReferencePoolVerifier<R> {
    registry: PoolRegistry,
    reserves: R,
    bands: ToleranceBands,
}

impl<R: ReserveSource> ReferencePoolVerifier<R> {
    pub fn new(registry: PoolRegistry, reserves: R, bands: ToleranceBands) -> Self {
        Self {
            registry,
            reserves,
            bands,
        }
    }

    /// Whether the claimed ratio for (sell, buy) sits inside the reserve
    /// band of the derived pool
    async fn reserve_band_accepts(
        &self,
        sell: Address,
        buy: Address,
        p_sell: U256,
        p_buy: U256,
    ) -> Result<bool> {
        let pool = self.registry.pair_address(sell, buy);
        let (reserve0, reserve1) = match self.reserves.reserves(pool).await {
            Ok(reserves) => reserves,
            Err(err) => {
                // No readable reserves: the realized band is the only
                // acceptance path left for this pair.
                warn!(%pool, error = %err, "reference pool unreadable, skipping reserve band");
                return Ok(false);
            }
        };
        let (reserve_sell, reserve_buy) = if sell < buy {
            (reserve0, reserve1)
        } else {
            (reserve1, reserve0)
        };
        if reserve_sell.is_zero() || reserve_buy.is_zero() {
            return Ok(false);
        }

        // claimed/fair = (p_sell / p_buy) / (reserve_buy / reserve_sell)
        bands::ratio_within(
            checked_mul(p_sell, reserve_sell)?,
            checked_mul(p_buy, reserve_buy)?,
            self.bands.reserve_num,
            self.bands.reserve_den,
            self.bands.reserve_num,
            self.bands.reserve_den,
        )
    }

    /// Whether any executed interaction realized a price for (sell, buy)
    /// close enough to the claimed ratio
    fn realized_band_accepts(
        &self,
        ctx: &PriceContext<'_>,
        sell: Address,
        buy: Address,
        p_sell: U256,
        p_buy: U256,
    ) -> Result<bool> {
        for swap in ctx.swaps.iter().filter(|s| s.matches_pair(sell, buy)) {
            // Amount on each side of the pair, whichever way the swap ran
            let (sell_side, buy_side) = if swap.token_out == sell {
                (swap.amount_out, swap.amount_in)
            } else {
                (swap.amount_in, swap.amount_out)
            };
            if sell_side.is_zero() || buy_side.is_zero() {
                continue;
            }

            // claimed/realized = (p_sell / p_buy) / (buy_side / sell_side)
            let accepts = bands::ratio_within(
                checked_mul(p_sell, sell_side)?,
                checked_mul(p_buy, buy_side)?,
                self.bands.realized_loose_num,
                self.bands.realized_loose_den,
                self.bands.realized_tight_num,
                self.bands.realized_tight_den,
            )?;
            if accepts {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl<R: ReserveSource> PriceVerifier for ReferencePoolVerifier<R> {
    async fn verify(&self, ctx: &PriceContext<'_>) -> Result<()> {
        for &(sell, buy) in ctx.pairs {
            let p_sell = ctx.price_of(sell)?;
            let p_buy = ctx.price_of(buy)?;
            if p_sell.is_zero() || p_buy.is_zero() {
                return Err(SettlementError::PriceRejected {
                    sell_token: sell,
                    buy_token: buy,
                });
            }

            if self.reserve_band_accepts(sell, buy, p_sell, p_buy).await? {
                debug!(%sell, %buy, "clearing price accepted by reserve band");
                continue;
            }
            if self.realized_band_accepts(ctx, sell, buy, p_sell, p_buy)? {
                debug!(%sell, %buy, "clearing price accepted by realized band");
                continue;
            }
            return Err(SettlementError::PriceRejected {
                sell_token: sell,
                buy_token: buy,
            });
        }
        Ok(())
    }
}

/// Fee-factor strategy: price safety is the clearing engine's limit check
pub struct FeeFactorVerifier {
    minimum: u64,
}

impl FeeFactorVerifier {
    pub fn new(minimum: u64) -> Self {
        Self { minimum }
    }
}

#[async_trait]
impl PriceVerifier for FeeFactorVerifier {
    async fn verify(&self, ctx: &PriceContext<'_>) -> Result<()> {
        if ctx.fee_factor < self.minimum {
            return Err(SettlementError::FeeFactorTooLow {
                fee_factor: ctx.fee_factor,
                minimum: self.minimum,
            });
        }
        for &(sell, buy) in ctx.pairs {
            if ctx.price_of(sell)?.is_zero() || ctx.price_of(buy)?.is_zero() {
                return Err(SettlementError::PriceRejected {
                    sell_token: sell,
                    buy_token: buy,
                });
            }
        }
        Ok(())
    }
}

fn checked_mul(a: U256, b: U256) -> Result<U256> {
    a.checked_mul(b).ok_or(SettlementError::AmountOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StubReserves(HashMap<Address, (U256, U256)>);

    #[async_trait]
    impl ReserveSource for StubReserves {
        async fn reserves(&self, pool: Address) -> Result<(U256, U256)> {
            self.0
                .get(&pool)
                .copied()
                .ok_or_else(|| SettlementError::malformed("no such pool"))
        }
    }

    fn registry() -> PoolRegistry {
        PoolRegistry::new(
            Address::repeat_byte(0xfa),
            alloy_primitives::B256::repeat_byte(0x1c),
        )
    }

    fn eth(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    fn ctx_tokens() -> (Address, Address) {
        (Address::repeat_byte(0x01), Address::repeat_byte(0x02))
    }

    #[tokio::test]
    async fn reserve_band_accepts_fair_price() {
        let (a, b) = ctx_tokens();
        let pool = registry().pair_address(a, b);
        // reserve ratio b/a = 13/14
        let reserves = StubReserves(HashMap::from([(pool, (eth(1400), eth(1300)))]));
        let verifier = ReferencePoolVerifier::new(registry(), reserves, ToleranceBands::default());

        let tokens = [a, b];
        let prices = [eth(13), eth(14)];
        let pairs = [(a, b)];
        let ctx = PriceContext {
            tokens: &tokens,
            clearing_prices: &prices,
            fee_factor: 1000,
            pairs: &pairs,
            swaps: &[],
        };
        verifier.verify(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn reserve_band_rejects_skewed_price() {
        let (a, b) = ctx_tokens();
        let pool = registry().pair_address(a, b);
        let reserves = StubReserves(HashMap::from([(pool, (eth(1400), eth(1300)))]));
        let verifier = ReferencePoolVerifier::new(registry(), reserves, ToleranceBands::default());

        let tokens = [a, b];
        // Claimed ratio 10% off the reserve ratio
        let prices = [eth(13), eth(14) + eth(14) / U256::from(10u64)];
        let pairs = [(a, b)];
        let ctx = PriceContext {
            tokens: &tokens,
            clearing_prices: &prices,
            fee_factor: 1000,
            pairs: &pairs,
            swaps: &[],
        };
        let err = verifier.verify(&ctx).await.unwrap_err();
        assert_eq!(err.error_code(), "PRICE_REJECTED");
    }

    #[tokio::test]
    async fn realized_band_rescues_thin_pool() {
        let (a, b) = ctx_tokens();
        // Pool exists but is wildly off the claimed price
        let pool = registry().pair_address(a, b);
        let reserves = StubReserves(HashMap::from([(pool, (eth(1), eth(50)))]));
        let verifier = ReferencePoolVerifier::new(registry(), reserves, ToleranceBands::default());

        let tokens = [a, b];
        let prices = [eth(13), eth(14)];
        let pairs = [(a, b)];
        // An executed interaction realized 13/14 almost exactly
        let swaps = [RealizedSwap {
            token_out: a,
            amount_out: eth(14),
            token_in: b,
            amount_in: eth(13),
        }];
        let ctx = PriceContext {
            tokens: &tokens,
            clearing_prices: &prices,
            fee_factor: 1000,
            pairs: &pairs,
            swaps: &swaps,
        };
        verifier.verify(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn missing_pool_and_no_swaps_rejects() {
        let (a, b) = ctx_tokens();
        let verifier = ReferencePoolVerifier::new(
            registry(),
            StubReserves(HashMap::new()),
            ToleranceBands::default(),
        );

        let tokens = [a, b];
        let prices = [eth(13), eth(14)];
        let pairs = [(a, b)];
        let ctx = PriceContext {
            tokens: &tokens,
            clearing_prices: &prices,
            fee_factor: 1000,
            pairs: &pairs,
            swaps: &[],
        };
        let err = verifier.verify(&ctx).await.unwrap_err();
        assert_eq!(err.error_code(), "PRICE_REJECTED");
    }

    #[tokio::test]
    async fn zero_price_rejects() {
        let (a, b) = ctx_tokens();
        let pool = registry().pair_address(a, b);
        let reserves = StubReserves(HashMap::from([(pool, (eth(1400), eth(1300)))]));
        let verifier = ReferencePoolVerifier::new(registry(), reserves, ToleranceBands::default());

        let tokens = [a, b];
        let prices = [eth(13), U256::ZERO];
        let pairs = [(a, b)];
        let ctx = PriceContext {
            tokens: &tokens,
            clearing_prices: &prices,
            fee_factor: 1000,
            pairs: &pairs,
            swaps: &[],
        };
        assert!(verifier.verify(&ctx).await.is_err());
    }

    #[tokio::test]
    async fn fee_factor_strategy_enforces_floor() {
        let (a, b) = ctx_tokens();
        let verifier = FeeFactorVerifier::new(500);
        let tokens = [a, b];
        let prices = [eth(13), eth(14)];
        let pairs = [(a, b)];

        let ctx = PriceContext {
            tokens: &tokens,
            clearing_prices: &prices,
            fee_factor: 400,
            pairs: &pairs,
            swaps: &[],
        };
        let err = verifier.verify(&ctx).await.unwrap_err();
        assert_eq!(err.error_code(), "FEE_FACTOR_TOO_LOW");

        let ctx = PriceContext {
            tokens: &tokens,
            clearing_prices: &prices,
            fee_factor: 500,
            pairs: &pairs,
            swaps: &[],
        };
        verifier.verify(&ctx).await.unwrap();
    }
}
