//! Condition evaluation for the v2 evaluator's gating prologue.
//!
//! Four condition kinds share one evaluation entry point so the evaluator
//! can short-circuit a candidate's condition list on the first failure
//! without caring which kind tripped it.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use crate::cache::TtlCache;
use crate::model::{ChainState, Condition, Operator, StateStore, TimeOperator};

/// Default TTL for cached oracle price lookups.
pub const PRICE_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(60);

/// A source of token prices, consulted by `price` conditions.
///
/// Implemented against a real price feed by the solver binary; tests and
/// the evaluator's own unit tests use a stub.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Fetch the current price of `token` on `chain_id` from `source`.
    ///
    /// # Errors
    ///
    /// Returns an error string on any lookup failure. Price conditions fail
    /// closed on an error - a missing price fails the condition, never the
    /// whole tick.
    async fn fetch_price(
        &self,
        token: Address,
        chain_id: u64,
        source: &str,
    ) -> Result<U256, String>;
}

/// Cache key for a price lookup: `(chain_id, token, source)`.
pub type PriceCacheKey = (u64, Address, String);

/// Shared cache type for oracle-backed price lookups.
pub type PriceCache = TtlCache<PriceCacheKey, U256>;

fn compare(operator: Operator, value: U256, target: U256, upper: Option<U256>) -> bool {
    match operator {
        Operator::Gt => value > target,
        Operator::Lt => value < target,
        Operator::Eq => value == target,
        Operator::Gte => value >= target,
        Operator::Lte => value <= target,
        Operator::Between => {
            let Some(upper) = upper else {
                warn!("between operator used without an upper bound, treating as failed");
                return false;
            };
            value >= target && value <= upper
        }
    }
}

/// Evaluate every condition on a Transfer in order, short-circuiting on the
/// first failure.
pub async fn evaluate_conditions(
    conditions: &[Condition],
    state: &StateStore,
    oracle: &dyn PriceOracle,
    price_cache: &PriceCache,
) -> bool {
    for condition in conditions {
        if !evaluate_one(condition, state, oracle, price_cache).await {
            return false;
        }
    }
    true
}

async fn evaluate_one(
    condition: &Condition,
    state: &StateStore,
    oracle: &dyn PriceOracle,
    price_cache: &PriceCache,
) -> bool {
    match condition {
        Condition::Time { operator, timestamp, end_timestamp } => {
            let now = Utc::now().timestamp();
            match operator {
                TimeOperator::After => now > *timestamp,
                TimeOperator::Before => now < *timestamp,
                TimeOperator::Between => match end_timestamp {
                    Some(end) => now >= *timestamp && now <= *end,
                    None => {
                        warn!("time condition Between used without end_timestamp, treating as failed");
                        false
                    }
                },
            }
        }
        Condition::Price { token, chain_id, operator, target, oracle_source } => {
            let key = (*chain_id, *token, oracle_source.clone());
            let price = if let Some(cached) = price_cache.get(&key) {
                Some(cached)
            } else {
                match oracle.fetch_price(*token, *chain_id, oracle_source).await {
                    Ok(price) => {
                        price_cache.insert(key, price);
                        Some(price)
                    }
                    Err(reason) => {
                        warn!(%token, chain_id, source = %oracle_source, %reason, "price oracle lookup failed, condition fails closed");
                        None
                    }
                }
            };
            match price {
                Some(price) => compare(*operator, price, *target, None),
                None => false,
            }
        }
        Condition::Balance { chain_id, token, operator, threshold } => {
            let Some(chain_state) = state.get(chain_id) else {
                return false;
            };
            let balance = balance_for(chain_state, *token);
            compare(*operator, balance, *threshold, None)
        }
        Condition::Custom(predicate) => predicate(state),
    }
}

fn balance_for(chain_state: &ChainState, token: Option<Address>) -> U256 {
    match token {
        Some(token) => chain_state.token_balance(token),
        None => chain_state.native_balance,
    }
}
