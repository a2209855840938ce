//! Profit scoring for the v2 evaluator: gas cost and opportunity cost
//! estimates, netted against the solver fee.

use alloy::primitives::U256;

use crate::cache::TtlCache;

/// Default TTL for cached gas-price lookups.
pub const GAS_PRICE_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(30);

/// Gas units a relay is assumed to cost, for planning purposes.
const RELAY_GAS_UNITS: u64 = 150_000;

/// Opportunity-cost formula numerator: `amountOut * BPS_PER_MINUTE * SECONDS_PER_MINUTE`.
const BPS_PER_MINUTE: u64 = 1000;

/// Seconds in the one-minute settlement window the formula plans for.
const SECONDS_PER_MINUTE: u64 = 60;

/// Opportunity-cost formula denominator.
const OPPORTUNITY_COST_DENOMINATOR: u64 = 3_600_000;

/// Shared cache type for gas-price lookups, keyed by chain ID.
pub type GasPriceCache = TtlCache<u64, U256>;

/// Compiled-in gas price fallback (wei) for a chain, used when no
/// `gas_price_wei_override` is configured for it. These are planning
/// upper bounds, not live oracle reads.
#[must_use]
pub fn default_gas_price_wei(chain_id: u64) -> U256 {
    const GWEI: u64 = 1_000_000_000;
    let wei = match chain_id {
        1 => 20 * GWEI,        // Ethereum mainnet
        137 => 30 * GWEI,      // Polygon
        42161 => GWEI / 10,    // Arbitrum
        10 => GWEI / 1000,     // Optimism
        _ => 20 * GWEI,
    };
    U256::from(wei)
}

/// Estimated gas cost in wei for relaying on `chain_id`.
#[must_use]
pub fn gas_cost_wei(chain_id: u64, gas_price_cache: &GasPriceCache) -> U256 {
    let gas_price = gas_price_cache.get_or_insert_with(chain_id, || default_gas_price_wei(chain_id));
    U256::from(RELAY_GAS_UNITS) * gas_price
}

/// Estimated opportunity cost in wei of holding `amount_out` idle for the
/// one-minute settlement window this formula plans for.
#[must_use]
pub fn opportunity_cost_wei(amount_out: U256) -> U256 {
    amount_out * U256::from(BPS_PER_MINUTE) * U256::from(SECONDS_PER_MINUTE)
        / U256::from(OPPORTUNITY_COST_DENOMINATOR)
}

/// Net profit in wei, floored at zero.
#[must_use]
pub fn net_profit_wei(solver_fee: U256, gas_cost: U256, opportunity_cost: U256) -> U256 {
    solver_fee.saturating_sub(gas_cost).saturating_sub(opportunity_cost)
}

/// `profit / solverFee`, as an `f64` for ranking. Zero if `solver_fee` is zero.
#[must_use]
pub fn profit_score(profit: U256, solver_fee: U256) -> f64 {
    if solver_fee.is_zero() {
        return 0.0;
    }
    // Both values fit comfortably in f64 precision for realistic fee sizes;
    // this is a ranking signal, not an accounting figure.
    let profit_f64 = u256_to_f64_lossy(profit);
    let fee_f64 = u256_to_f64_lossy(solver_fee);
    profit_f64 / fee_f64
}

fn u256_to_f64_lossy(value: U256) -> f64 {
    value.to_string().parse().unwrap_or(f64::MAX)
}

/// Overall ranking score: `profitScore - 10 * risk`.
#[must_use]
pub fn overall_score(profit_score: f64, risk: f64) -> f64 {
    profit_score - 10.0 * risk
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opportunity_cost_matches_formula() {
        let amount = U256::from(3_600_000u64);
        let expected = amount * U256::from(1000u64) * U256::from(60u64) / U256::from(3_600_000u64);
        assert_eq!(opportunity_cost_wei(amount), expected);
    }

    #[test]
    fn gas_cost_uses_default_when_uncached() {
        let cache = GasPriceCache::new(GAS_PRICE_CACHE_TTL);
        let cost = gas_cost_wei(1, &cache);
        assert_eq!(cost, U256::from(RELAY_GAS_UNITS) * default_gas_price_wei(1));
    }

    #[test]
    fn net_profit_floors_at_zero() {
        let profit = net_profit_wei(U256::from(10u64), U256::from(100u64), U256::ZERO);
        assert_eq!(profit, U256::ZERO);
    }

    #[test]
    fn profit_score_is_fraction_of_fee() {
        let score = profit_score(U256::from(50u64), U256::from(100u64));
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn overall_score_penalizes_risk_heavily() {
        assert!(overall_score(1.0, 0.2) < overall_score(1.0, 0.1));
    }
}
