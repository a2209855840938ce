//! The v1 "simple" evaluator: a plain filter-and-commit pass over one
//! chain's pending transfers, no scoring.

use tracing::info;

use crate::inflight::InFlightCache;
use crate::model::{StateStore, Trade};

/// Minimum solver fee below which a candidate is skipped outright.
pub const MIN_SOLVER_FEE_WEI: u128 = 1;

/// Evaluate chain `chain_id`'s pending transfers against a per-tick shallow
/// clone of the State Store, returning Trades in source-chain order.
///
/// `state` must be the evaluator's own clone - debits applied here are
/// shadow debits against candidates later in this same call and are never
/// written back to the canonical State Store.
#[must_use]
pub fn evaluate_v1(chain_id: u64, state: &mut StateStore, inflight: &InFlightCache) -> Vec<Trade> {
    let Some(chain_state) = state.get(&chain_id) else {
        return Vec::new();
    };

    let candidates: Vec<_> = chain_state
        .transfers
        .iter()
        .filter(|transfer| {
            let dest_id = transfer.params.dst_chain_id;
            !state
                .get(&dest_id)
                .is_some_and(|dest| dest.already_fulfilled.contains(&transfer.request_id))
        })
        .cloned()
        .collect();

    let mut trades = Vec::new();

    for transfer in candidates {
        let request_id = transfer.request_id;

        if inflight.has(request_id) {
            info!(%request_id, "skip: already in flight");
            continue;
        }
        if transfer.params.executed {
            info!(%request_id, "skip: already executed");
            continue;
        }

        let dest_id = transfer.params.dst_chain_id;
        let Some(dest) = state.get(&dest_id) else {
            info!(%request_id, dest_chain_id = dest_id, "skip: destination chain state unknown");
            continue;
        };

        if dest.native_balance.is_zero() {
            info!(%request_id, "skip: destination native balance is zero");
            continue;
        }

        let Some(&token_balance) = dest.token_balances.get(&transfer.params.token_out) else {
            info!(%request_id, "skip: destination token balance absent");
            continue;
        };

        if token_balance < transfer.params.amount_out {
            info!(%request_id, "skip: destination token balance insufficient");
            continue;
        }

        if transfer.params.solver_fee < alloy::primitives::U256::from(MIN_SOLVER_FEE_WEI) {
            info!(%request_id, "skip: solver fee below minimum");
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
    use crate::model::{ChainState, RequestId, SwapRequestParameters, Transfer};
    use alloy::primitives::{Address, B256, U256};

    fn sample_transfer(byte: u8, dst_chain_id: u64, token_out: Address, amount: U256) -> Transfer {
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
                solver_fee: U256::from(1_000_000u64),
                nonce: U256::from(u64::from(byte)),
                executed: false,
                requested_at: U256::ZERO,
            },
            conditions: Vec::new(),
            priority: None,
        }
    }

    #[test]
    fn emits_trade_when_inventory_sufficient() {
        let token_out = Address::repeat_byte(0x44);
        let transfer = sample_transfer(1, 2, token_out, U256::from(100u64));

        let mut src = ChainState::default();
        src.transfers.push(transfer);

        let mut dst = ChainState::default();
        dst.native_balance = U256::from(1u64);
        dst.token_balances.insert(token_out, U256::from(500u64));

        let mut state = StateStore::new();
        state.insert(1, src);
        state.insert(2, dst);

        let inflight = InFlightCache::default();
        let trades = evaluate_v1(1, &mut state, &inflight);

        assert_eq!(trades.len(), 1);
        assert_eq!(state.get(&2).unwrap().token_balance(token_out), U256::from(400u64));
    }

    #[test]
    fn skips_when_already_in_flight() {
        let token_out = Address::repeat_byte(0x44);
        let transfer = sample_transfer(1, 2, token_out, U256::from(100u64));
        let request_id = transfer.request_id;

        let mut src = ChainState::default();
        src.transfers.push(transfer);
        let mut dst = ChainState::default();
        dst.native_balance = U256::from(1u64);
        dst.token_balances.insert(token_out, U256::from(500u64));

        let mut state = StateStore::new();
        state.insert(1, src);
        state.insert(2, dst);

        let inflight = InFlightCache::default();
        inflight.set_default(request_id);

        let trades = evaluate_v1(1, &mut state, &inflight);
        assert!(trades.is_empty());
    }

    #[test]
    fn second_candidate_loses_tiebreak_on_depleted_inventory() {
        let token_out = Address::repeat_byte(0x44);
        let first = sample_transfer(1, 2, token_out, U256::from(400u64));
        let second = sample_transfer(2, 2, token_out, U256::from(400u64));

        let mut src = ChainState::default();
        src.transfers.push(first);
        src.transfers.push(second);

        let mut dst = ChainState::default();
        dst.native_balance = U256::from(1u64);
        dst.token_balances.insert(token_out, U256::from(500u64));

        let mut state = StateStore::new();
        state.insert(1, src);
        state.insert(2, dst);

        let inflight = InFlightCache::default();
        let trades = evaluate_v1(1, &mut state, &inflight);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].request_id, RequestId::from_bytes(B256::repeat_byte(1)));
    }

    #[test]
    fn drops_transfer_already_fulfilled_on_destination() {
        let token_out = Address::repeat_byte(0x44);
        let transfer = sample_transfer(1, 2, token_out, U256::from(100u64));
        let request_id = transfer.request_id;

        let mut src = ChainState::default();
        src.transfers.push(transfer);

        let mut dst = ChainState::default();
        dst.native_balance = U256::from(1u64);
        dst.token_balances.insert(token_out, U256::from(500u64));
        dst.already_fulfilled.insert(request_id);

        let mut state = StateStore::new();
        state.insert(1, src);
        state.insert(2, dst);

        let inflight = InFlightCache::default();
        let trades = evaluate_v1(1, &mut state, &inflight);
        assert!(trades.is_empty());
    }
}
