//! Domain types shared by both evaluator variants: the wire shape of a swap
//! request, the per-chain state snapshot, and the decision record (`Trade`)
//! an evaluator hands to the executor.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};

use crate::error::{ModelError, Result};

/// A canonicalized request ID: lower-case, `0x`-prefixed, 66 characters.
///
/// Wrapping [`B256`] makes canonicalization structural - two `RequestId`s
/// compare equal iff their underlying bytes are equal, regardless of how the
/// original hex string was cased or whether it carried a `0x` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(B256);

impl RequestId {
    /// Wrap an already-decoded 32-byte value (e.g. straight off the wire).
    #[must_use]
    pub const fn from_bytes(bytes: B256) -> Self {
        Self(bytes)
    }

    /// The raw 32 bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &B256 {
        &self.0
    }
}

impl FromStr for RequestId {
    type Err = ModelError;

    /// Parse a request ID from hex, accepting any case and an optional `0x`
    /// prefix - the two forms observed from different RPC paths.
    fn from_str(s: &str) -> Result<Self, ModelError> {
        let trimmed = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        if trimmed.len() != 64 {
            return Err(ModelError::InvalidRequestId(s.to_string()));
        }
        let bytes = hex::decode(trimmed).map_err(|_| ModelError::InvalidRequestId(s.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ModelError::InvalidRequestId(s.to_string()))?;
        Ok(Self(B256::from(arr)))
    }
}

impl fmt::Display for RequestId {
    /// Always renders lower-case and `0x`-prefixed, 66 characters total.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Reduce a raw, possibly 256-bit chain ID to its internal 64-bit key.
///
/// Internal maps are always keyed on this 64-bit form, never on the raw
/// value - see the module invariant this implements.
#[must_use]
pub fn normalize_chain_id(raw: U256) -> u64 {
    let masked = raw & U256::from(u64::MAX);
    masked.to::<u64>()
}

/// The wire shape of a request stored by the on-chain router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequestParameters {
    /// Normalized source chain ID.
    pub src_chain_id: u64,
    /// Normalized destination chain ID.
    pub dst_chain_id: u64,
    /// Address that submitted the request on the source chain.
    pub sender: Address,
    /// Address that should receive `amount_out` on the destination chain.
    pub recipient: Address,
    /// Token debited on the source chain.
    pub token_in: Address,
    /// Token the recipient must receive on the destination chain.
    pub token_out: Address,
    /// Amount the recipient must receive, in `token_out`'s smallest unit.
    pub amount_out: U256,
    /// Fee paid to the verification layer.
    pub verification_fee: U256,
    /// Fee paid to whichever solver settles this request.
    pub solver_fee: U256,
    /// Uniqueness scope is (sender, destination, token, amount), not this
    /// field alone.
    pub nonce: U256,
    /// Set by the source chain once the solver has been refunded.
    pub executed: bool,
    /// Unix-second submission timestamp.
    pub requested_at: U256,
}

/// Comparison operator shared by `price` and `balance` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Equal to.
    Eq,
    /// Greater than or equal to.
    Gte,
    /// Less than or equal to.
    Lte,
    /// Between two bounds, inclusive.
    Between,
}

/// Comparison operator for `time` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOperator {
    /// Wall clock must be after `timestamp`.
    After,
    /// Wall clock must be before `timestamp`.
    Before,
    /// Wall clock must be between `timestamp` and `end_timestamp`.
    Between,
}

/// A single gating condition attached to a Transfer.
#[derive(Clone)]
pub enum Condition {
    /// Gate on wall-clock time.
    Time {
        /// Which comparison to perform.
        operator: TimeOperator,
        /// Unix-second timestamp.
        timestamp: i64,
        /// Required only when `operator` is `Between`.
        end_timestamp: Option<i64>,
    },
    /// Gate on an oracle-sourced price.
    Price {
        /// Token the price is quoted for.
        token: Address,
        /// Chain the price oracle should be consulted on.
        chain_id: u64,
        /// Comparison to perform against `target`.
        operator: Operator,
        /// Target price.
        target: U256,
        /// Oracle source identifier (e.g. `"chainlink"`).
        oracle_source: String,
    },
    /// Gate on a chain-state balance.
    Balance {
        /// Chain to read the balance on.
        chain_id: u64,
        /// Token balance to read; `None` reads the native balance.
        token: Option<Address>,
        /// Comparison to perform against `threshold`.
        operator: Operator,
        /// Threshold amount.
        threshold: U256,
    },
    /// Caller-supplied predicate over the cloned State Store.
    Custom(Arc<dyn Fn(&HashMap<u64, ChainState>) -> bool + Send + Sync>),
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time { operator, timestamp, end_timestamp } => f
                .debug_struct("Time")
                .field("operator", operator)
                .field("timestamp", timestamp)
                .field("end_timestamp", end_timestamp)
                .finish(),
            Self::Price { token, chain_id, operator, target, oracle_source } => f
                .debug_struct("Price")
                .field("token", token)
                .field("chain_id", chain_id)
                .field("operator", operator)
                .field("target", target)
                .field("oracle_source", oracle_source)
                .finish(),
            Self::Balance { chain_id, token, operator, threshold } => f
                .debug_struct("Balance")
                .field("chain_id", chain_id)
                .field("token", token)
                .field("operator", operator)
                .field("threshold", threshold)
                .finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<closure>").finish(),
        }
    }
}

/// One unfulfilled request observed on a source chain.
#[derive(Debug, Clone)]
pub struct Transfer {
    /// Canonical request ID.
    pub request_id: RequestId,
    /// The request's on-chain parameters.
    pub params: SwapRequestParameters,
    /// Optional gating conditions (v2 only).
    pub conditions: Vec<Condition>,
    /// Optional ranking hint (v2 only); higher sorts first before scoring.
    pub priority: Option<u32>,
}

/// Per-chain snapshot of the solver's inventory and the requests it sees.
#[derive(Debug, Clone, Default)]
pub struct ChainState {
    /// Native token balance of the solver's wallet, in wei.
    pub native_balance: U256,
    /// ERC-20 balances, keyed by token address.
    pub token_balances: HashMap<Address, U256>,
    /// Unfulfilled transfers observed on this chain.
    pub transfers: Vec<Transfer>,
    /// Request IDs this chain reports as already fulfilled.
    pub already_fulfilled: HashSet<RequestId>,
}

impl ChainState {
    /// Balance of `token`, or zero if untracked.
    #[must_use]
    pub fn token_balance(&self, token: Address) -> U256 {
        self.token_balances.get(&token).copied().unwrap_or(U256::ZERO)
    }

    /// Debit `token`'s balance by `amount`, saturating at zero.
    ///
    /// Called only against a per-tick clone of the State Store - see the
    /// shadow-balance invariant this implements.
    pub fn debit_token(&mut self, token: Address, amount: U256) {
        if let Some(balance) = self.token_balances.get_mut(&token) {
            *balance = balance.saturating_sub(amount);
        }
    }
}

/// The full per-chain State Store, keyed by normalized chain ID.
pub type StateStore = HashMap<u64, ChainState>;

/// A decision to settle one Transfer, ready for the Executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    /// Canonical request ID.
    pub request_id: RequestId,
    /// Nonce carried from the source request.
    pub nonce: U256,
    /// Token debited on the source chain.
    pub token_in_addr: Address,
    /// Token credited on the destination chain.
    pub token_out_addr: Address,
    /// Normalized source chain ID.
    pub src_chain_id: u64,
    /// Normalized destination chain ID.
    pub dest_chain_id: u64,
    /// Requester address.
    pub sender_addr: Address,
    /// Recipient address.
    pub recipient_addr: Address,
    /// Amount to relay on the destination chain.
    pub swap_amount: U256,
}

impl Trade {
    /// Build a Trade from a Transfer, as both evaluators do on commit.
    #[must_use]
    pub fn from_transfer(transfer: &Transfer) -> Self {
        let p = &transfer.params;
        Self {
            request_id: transfer.request_id,
            nonce: p.nonce,
            token_in_addr: p.token_in,
            token_out_addr: p.token_out,
            src_chain_id: p.src_chain_id,
            dest_chain_id: p.dst_chain_id,
            sender_addr: p.sender,
            recipient_addr: p.recipient,
            swap_amount: p.amount_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_canonicalizes_case_and_prefix() {
        let a: RequestId = "0xABCDEF0000000000000000000000000000000000000000000000000000ABCD"
            .parse()
            .expect("parse");
        let b: RequestId = "abcdef0000000000000000000000000000000000000000000000000000abcd"
            .parse()
            .expect("parse");
        assert_eq!(a, b);
        assert_eq!(a.to_string().len(), 66);
        assert!(a.to_string().starts_with("0x"));
        assert_eq!(a.to_string(), a.to_string().to_lowercase());
    }

    #[test]
    fn request_id_rejects_wrong_length() {
        assert!("0xabcd".parse::<RequestId>().is_err());
    }

    #[test]
    fn normalize_chain_id_takes_low_64_bits() {
        let raw = (U256::from(7u64) << 64) | U256::from(31337u64);
        assert_eq!(normalize_chain_id(raw), 31337);
        assert_eq!(normalize_chain_id(U256::from(1u64)), 1);
    }

    #[test]
    fn debit_token_saturates_at_zero() {
        let mut state = ChainState::default();
        let token = Address::repeat_byte(0x11);
        state.token_balances.insert(token, U256::from(100u64));
        state.debit_token(token, U256::from(150u64));
        assert_eq!(state.token_balance(token), U256::ZERO);
    }
}
