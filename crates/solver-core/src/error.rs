//! Error types for solver-core, mapped onto the five-category error
//! taxonomy the whole solver follows (transient I/O, semantic skip, on-chain
//! revert, configuration, programmer invariant).

use alloy::primitives::U256;
use thiserror::Error;

/// Result type alias for solver-core operations.
pub type Result<T, E = SolverError> = std::result::Result<T, E>;

/// Errors raised while decoding or evaluating swap requests.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Malformed request ID (wrong length, non-hex).
    #[error("invalid request id: {0}")]
    InvalidRequestId(String),

    /// A chain ID did not fit in 64 bits at decode time.
    #[error("chain id out of range: {0}")]
    ChainIdOutOfRange(U256),

    /// An unrecognized condition-type tag - a programmer invariant, not a
    /// user-facing failure; the candidate carrying it is skipped.
    #[error("unknown condition type: {0}")]
    UnknownConditionType(String),

    /// A price-oracle lookup failed; `price` conditions fail closed on this.
    #[error("price oracle error for {token_pair} on chain {chain_id}: {reason}")]
    OracleUnavailable {
        /// The token pair the lookup was for, formatted for logging.
        token_pair: String,
        /// The chain the lookup targeted.
        chain_id: u64,
        /// Why the lookup failed.
        reason: String,
    },

    /// Decode failure reading the router's return data.
    #[error("router decode error: {0}")]
    RouterDecode(#[from] router_contracts::decode::DecodeError),
}

/// The model-level subset of [`SolverError`] returned by parsing constructors.
///
/// Kept distinct from `SolverError` so `model.rs` doesn't need to depend on
/// the rest of this crate's error surface.
pub type ModelError = SolverError;
