//! Risk scoring for the v2 evaluator: four axes, averaged into a [0, 1]
//! score. Candidates scoring at or above a configurable threshold are
//! dropped before profit is even computed.

use alloy::primitives::{Address, U256};

use crate::model::{ChainState, SwapRequestParameters};

/// Default risk threshold: candidates scoring at or above this are dropped.
pub const DEFAULT_RISK_THRESHOLD: f64 = 0.3;

/// Minimum solver fee below which the fee axis is scored as risky.
pub const DEFAULT_MIN_SOLVER_FEE: u128 = 1_000_000_000_000_000; // 1e15

const NATIVE_BALANCE_LOW_WATERMARK: u128 = 100_000_000_000_000_000; // 1e17

fn liquidity_axis(dest: Option<&ChainState>, params: &SwapRequestParameters) -> f64 {
    let Some(dest) = dest else { return 1.0 };
    let balance = dest.token_balance(params.token_out);
    if balance.is_zero() && !dest.token_balances.contains_key(&params.token_out) {
        return 1.0;
    }
    if balance < params.amount_out {
        return 0.8;
    }
    // balance / required < 1.1  <=>  balance * 10 < required * 11
    if balance.saturating_mul(U256::from(10u64)) < params.amount_out.saturating_mul(U256::from(11u64)) {
        return 0.5;
    }
    0.1
}

fn fee_axis(params: &SwapRequestParameters, min_solver_fee: U256) -> f64 {
    if params.solver_fee < min_solver_fee {
        0.9
    } else {
        0.1
    }
}

fn execution_axis(dest: Option<&ChainState>) -> f64 {
    let Some(dest) = dest else { return 1.0 };
    if dest.native_balance.is_zero() {
        1.0
    } else if dest.native_balance < U256::from(NATIVE_BALANCE_LOW_WATERMARK) {
        0.6
    } else {
        0.2
    }
}

fn counterparty_axis(params: &SwapRequestParameters) -> f64 {
    if params.sender.is_zero() || params.recipient.is_zero() {
        0.5
    } else {
        0.1
    }
}

/// Compute the averaged four-axis risk score for a candidate.
#[must_use]
pub fn risk_score(
    params: &SwapRequestParameters,
    dest: Option<&ChainState>,
    min_solver_fee: U256,
) -> f64 {
    let axes = [
        liquidity_axis(dest, params),
        fee_axis(params, min_solver_fee),
        execution_axis(dest),
        counterparty_axis(params),
    ];
    axes.iter().sum::<f64>() / axes.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_params() -> SwapRequestParameters {
        SwapRequestParameters {
            src_chain_id: 1,
            dst_chain_id: 2,
            sender: Address::repeat_byte(0x11),
            recipient: Address::repeat_byte(0x22),
            token_in: Address::repeat_byte(0x33),
            token_out: Address::repeat_byte(0x44),
            amount_out: U256::from(1_000u64),
            verification_fee: U256::from(1u64),
            solver_fee: U256::from(2_000_000_000_000_000u64),
            nonce: U256::from(1u64),
            executed: false,
            requested_at: U256::ZERO,
        }
    }

    #[test]
    fn missing_destination_is_maximally_risky_on_liquidity_and_execution() {
        let params = sample_params();
        let score = risk_score(&params, None, U256::from(DEFAULT_MIN_SOLVER_FEE));
        // liquidity=1.0, fee=0.1 (fee above minimum), execution=1.0, counterparty=0.1
        assert!((score - 0.55).abs() < 1e-9);
    }

    #[test]
    fn healthy_destination_scores_low() {
        let params = sample_params();
        let mut dest = ChainState::default();
        dest.native_balance = U256::from(1_000_000_000_000_000_000u64);
        dest.token_balances.insert(params.token_out, U256::from(10_000u64));
        let score = risk_score(&params, Some(&dest), U256::from(DEFAULT_MIN_SOLVER_FEE));
        assert!(score < DEFAULT_RISK_THRESHOLD);
    }

    #[test]
    fn zero_address_counterparty_raises_score() {
        let mut params = sample_params();
        params.sender = Address::ZERO;
        let mut dest = ChainState::default();
        dest.native_balance = U256::from(1_000_000_000_000_000_000u64);
        dest.token_balances.insert(params.token_out, U256::from(10_000u64));
        let with_zero = risk_score(&params, Some(&dest), U256::from(DEFAULT_MIN_SOLVER_FEE));

        params.sender = Address::repeat_byte(0x99);
        let without_zero = risk_score(&params, Some(&dest), U256::from(DEFAULT_MIN_SOLVER_FEE));

        assert!(with_zero > without_zero);
    }
}
