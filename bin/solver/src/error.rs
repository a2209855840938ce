//! Error types for the solver service.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for solver service operations.
pub type Result<T> = std::result::Result<T, SolverAppError>;

/// Errors that can occur in the solver service.
#[derive(Debug, Error)]
pub enum SolverAppError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Provider error from a chain's RPC transport.
    #[error("provider error on chain {chain_id}: {source}")]
    Provider {
        /// Chain the error occurred on.
        chain_id: u64,
        /// Underlying provider error.
        source: evm_provider::ProviderError,
    },

    /// Evaluator/model error from solver-core.
    #[error("solver error: {0}")]
    Solver(#[from] solver_core::SolverError),

    /// No chain client configured for a chain ID referenced by a transfer.
    #[error("no chain client configured for chain {0}")]
    UnknownChain(u64),

    /// No signer configured (neither `--private-key` nor `SOLVER_PRIVATE_KEY` set).
    #[error("no signer configured: pass --private-key or set SOLVER_PRIVATE_KEY")]
    NoSigner,

    /// A sent transaction reverted on-chain.
    #[error("transaction reverted on chain {chain_id}: {reason}")]
    Reverted {
        /// Chain the revert occurred on.
        chain_id: u64,
        /// Human-readable revert reason.
        reason: String,
        /// Decoded selector, when recognized, for programmatic handling.
        revert: Option<router_contracts::selectors::RouterRevert>,
    },

    /// Internal error that doesn't fit another variant.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        /// Path to the file.
        path: PathBuf,
        /// IO error.
        source: std::io::Error,
    },

    /// Failed to parse config file.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path to the file.
        path: PathBuf,
        /// TOML parse error.
        source: Box<toml::de::Error>,
    },

    /// No config file found at any candidate location.
    #[error("no config file found: tried {0:?}")]
    NotFound(Vec<PathBuf>),

    /// Validation error.
    #[error("config validation failed: {0}")]
    Validation(String),
}
