//! The v2 "scored" evaluator: the same filtering prologue as v1, followed by
//! condition gating, a four-axis risk score, and a profit score, ranked and
//! committed in descending overall-score order.

use alloy::primitives::U256;
use tracing::info;

use crate::condition::{evaluate_conditions, PriceCache, PriceOracle};
use crate::inflight::InFlightCache;
use crate::model::{ChainState, StateStore, Trade, Transfer};
use crate::profit::{self, GasPriceCache};
use crate::risk::{self, DEFAULT_MIN_SOLVER_FEE, DEFAULT_RISK_THRESHOLD};

/// Tunable parameters for a single v2 evaluation pass.
#[derive(Debug, Clone, Copy)]
pub struct V2Params {
    /// Minimum solver fee a candidate must carry to survive the prologue.
    pub min_solver_fee: U256,
    /// Risk scores at or above this are dropped.
    pub risk_threshold: f64,
}

impl Default for V2Params {
    fn default() -> Self {
        Self {
            min_solver_fee: U256::from(DEFAULT_MIN_SOLVER_FEE),
            risk_threshold: DEFAULT_RISK_THRESHOLD,
        }
    }
}

struct ScoredCandidate {
    transfer: Transfer,
    overall_score: f64,
}

fn passes_filter_prologue(
    transfer: &Transfer,
    state: &StateStore,
    inflight: &InFlightCache,
    min_solver_fee: U256,
) -> bool {
    let request_id = transfer.request_id;

    if inflight.has(request_id) {
        info!(%request_id, "skip: already in flight");
        return false;
    }
    if transfer.params.executed {
        info!(%request_id, "skip: already executed");
        return false;
    }

    let Some(dest) = state.get(&transfer.params.dst_chain_id) else {
        info!(%request_id, "skip: destination chain state unknown");
        return false;
    };

    if dest.native_balance.is_zero() {
        info!(%request_id, "skip: destination native balance is zero");
        return false;
    }

    let Some(&balance) = dest.token_balances.get(&transfer.params.token_out) else {
        info!(%request_id, "skip: destination token balance absent");
        return false;
    };

    if balance < transfer.params.amount_out {
        info!(%request_id, "skip: destination token balance insufficient");
        return false;
    }

    if transfer.params.solver_fee < min_solver_fee {
        info!(%request_id, "skip: solver fee below minimum");
        return false;
    }

    true
}

/// Evaluate chain `chain_id`'s pending transfers with the scored v2 pass.
///
/// Like v1, `state` must already be the evaluator's own per-tick clone.
#[allow(clippy::too_many_arguments)]
pub async fn evaluate_v2(
    chain_id: u64,
    state: &mut StateStore,
    inflight: &InFlightCache,
    oracle: &dyn PriceOracle,
    price_cache: &PriceCache,
    gas_price_cache: &GasPriceCache,
    params: V2Params,
) -> Vec<Trade> {
    let Some(chain_state) = state.get(&chain_id) else {
        return Vec::new();
    };

    let fulfilled_prefiltered: Vec<Transfer> = chain_state
        .transfers
        .iter()
        .filter(|transfer| {
            !state
                .get(&transfer.params.dst_chain_id)
                .is_some_and(|dest| dest.already_fulfilled.contains(&transfer.request_id))
        })
        .cloned()
        .collect();

    let mut scored = Vec::new();

    for transfer in fulfilled_prefiltered {
        if !passes_filter_prologue(&transfer, state, inflight, params.min_solver_fee) {
            continue;
        }

        if !evaluate_conditions(&transfer.conditions, state, oracle, price_cache).await {
            info!(request_id = %transfer.request_id, "skip: condition not met");
            continue;
        }

        let dest: Option<&ChainState> = state.get(&transfer.params.dst_chain_id);
        let risk = risk::risk_score(&transfer.params, dest, params.min_solver_fee);
        if risk >= params.risk_threshold {
            info!(request_id = %transfer.request_id, risk, "skip: risk score at or above threshold");
            continue;
        }

        let gas_cost = profit::gas_cost_wei(transfer.params.dst_chain_id, gas_price_cache);
        let opportunity_cost = profit::opportunity_cost_wei(transfer.params.amount_out);
        let net_profit = profit::net_profit_wei(transfer.params.solver_fee, gas_cost, opportunity_cost);
        let profit_score = profit::profit_score(net_profit, transfer.params.solver_fee);
        let overall_score = profit::overall_score(profit_score, risk);

        scored.push(ScoredCandidate { transfer, overall_score });
    }

    // Stable sort: candidates with equal scores keep source-chain order,
    // mirroring v1's earlier-wins tie-break.
    scored.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));

    let mut trades = Vec::new();
    for candidate in scored {
        let transfer = candidate.transfer;
        let dest_id = transfer.params.dst_chain_id;

        let still_covered = state
            .get(&dest_id)
            .is_some_and(|dest| dest.token_balance(transfer.params.token_out) >= transfer.params.amount_out);

        if !still_covered {
            info!(request_id = %transfer.request_id, "skip: inventory consumed by a higher-ranked candidate");
            continue;
        }

        if let Some(dest) = state.get_mut(&dest_id) {
            dest.debit_token(transfer.params.token_out, transfer.params.amount_out);
        }

        trades.push(Trade::from_transfer(&transfer));
    }

    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RequestId, SwapRequestParameters};
    use alloy::primitives::{Address, B256};
    use async_trait::async_trait;

    struct NoPriceOracle;

    #[async_trait]
    impl PriceOracle for NoPriceOracle {
        async fn fetch_price(&self, _token: Address, _chain_id: u64, _source: &str) -> Result<U256, String> {
            Err("no oracle configured".into())
        }
    }

    fn sample_transfer(byte: u8, dst_chain_id: u64, token_out: Address, amount: U256, solver_fee: U256) -> Transfer {
        Transfer {
            request_id: RequestId::from_bytes(B256::repeat_byte(byte)),
            params: SwapRequestParameters {
                src_chain_id: 1,
                dst_chain_id,
                sender: Address::repeat_byte(0xAA),
                recipient: Address::repeat_byte(0xBB),
                token_in: Address::repeat_byte(0xCC),
                token_out,
                amount_out: amount,
                verification_fee: U256::from(1u64),
                solver_fee,
                nonce: U256::from(u64::from(byte)),
                executed: false,
                requested_at: U256::ZERO,
            },
            conditions: Vec::new(),
            priority: None,
        }
    }

    #[tokio::test]
    async fn ranks_higher_fee_candidate_first_when_inventory_is_scarce() {
        let token_out = Address::repeat_byte(0x44);
        let low_fee = sample_transfer(1, 2, token_out, U256::from(400u64), U256::from(2_000_000_000_000_000u64));
        let high_fee = sample_transfer(2, 2, token_out, U256::from(400u64), U256::from(900_000_000_000_000_000u64));

        let mut src = ChainState::default();
        src.transfers.push(low_fee);
        src.transfers.push(high_fee.clone());

        let mut dst = ChainState::default();
        dst.native_balance = U256::from(1_000_000_000_000_000_000u64);
        dst.token_balances.insert(token_out, U256::from(400u64));

        let mut state = StateStore::new();
        state.insert(1, src);
        state.insert(2, dst);

        let inflight = InFlightCache::default();
        let oracle = NoPriceOracle;
        let price_cache = PriceCache::new(crate::condition::PRICE_CACHE_TTL);
        let gas_cache = GasPriceCache::new(profit::GAS_PRICE_CACHE_TTL);

        let trades = evaluate_v2(1, &mut state, &inflight, &oracle, &price_cache, &gas_cache, V2Params::default()).await;

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].request_id, high_fee.request_id);
    }

    #[tokio::test]
    async fn drops_candidate_below_minimum_fee() {
        let token_out = Address::repeat_byte(0x44);
        let transfer = sample_transfer(1, 2, token_out, U256::from(100u64), U256::from(1u64));

        let mut src = ChainState::default();
        src.transfers.push(transfer);
        let mut dst = ChainState::default();
        dst.native_balance = U256::from(1_000_000_000_000_000_000u64);
        dst.token_balances.insert(token_out, U256::from(500u64));

        let mut state = StateStore::new();
        state.insert(1, src);
        state.insert(2, dst);

        let inflight = InFlightCache::default();
        let oracle = NoPriceOracle;
        let price_cache = PriceCache::new(crate::condition::PRICE_CACHE_TTL);
        let gas_cache = GasPriceCache::new(profit::GAS_PRICE_CACHE_TTL);

        let trades = evaluate_v2(1, &mut state, &inflight, &oracle, &price_cache, &gas_cache, V2Params::default()).await;
        assert!(trades.is_empty());
    }
}
