//! Domain model and settlement logic for the cross-chain swap solver.
//!
//! This crate is chain-agnostic: it knows the shape of a swap request, how
//! to decide which requests to settle from the solver's own inventory, and
//! how to prevent the same request from being settled twice. It knows
//! nothing about RPC transport - that lives in `evm-provider` and the
//! solver binary's network glue.
//!
//! # Crate Relationships
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Application Layer                                           │
//! │  └─ bin/solver (main service)                                 │
//! └──────────────────────────────────┬───────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Evaluation Layer (solver-core) ◄── YOU ARE HERE              │
//! │  └─ model: SwapRequestParameters, Transfer, ChainState, Trade  │
//! │  └─ inflight: TTL cache preventing double-execution           │
//! │  └─ solver / solver_v2: the two evaluator variants             │
//! │  └─ condition / risk / profit: v2's scoring building blocks     │
//! └──────────────────────────────────┬───────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Chain Abstraction Layer (evm-provider, router-contracts)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! ## Evaluators
//!
//! [`solver::evaluate_v1`] is a plain filter-and-commit pass. [`solver_v2::evaluate_v2`]
//! adds condition gating, a four-axis risk score, and a profit-ranked commit
//! order. Both operate against a per-tick shallow clone of the
//! [`model::StateStore`] so intra-tick inventory commits never leak into the
//! canonical store.
//!
//! ## In-Flight Cache
//!
//! [`inflight::InFlightCache`] is the sole synchronization primitive
//! preventing two concurrently ticking chains from relaying the same
//! request twice.

#![doc(html_root_url = "https://docs.onlyswaps.io/solver-core")]

pub mod cache;
pub mod condition;
pub mod error;
pub mod inflight;
pub mod model;
pub mod profit;
pub mod risk;
pub mod solver;
pub mod solver_v2;

pub use error::{Result, SolverError};
pub use inflight::InFlightCache;
pub use model::{
    ChainState, Condition, Operator, RequestId, StateStore, SwapRequestParameters, TimeOperator,
    Trade, Transfer,
};
pub use solver::evaluate_v1;
pub use solver_v2::{evaluate_v2, V2Params};

/// Convenience re-exports for common use.
pub mod prelude {
    pub use crate::condition::{PriceCache, PriceOracle};
    pub use crate::error::{Result, SolverError};
    pub use crate::inflight::InFlightCache;
    pub use crate::model::{
        ChainState, Condition, Operator, RequestId, StateStore, SwapRequestParameters,
        TimeOperator, Trade, Transfer,
    };
    pub use crate::profit::GasPriceCache;
    pub use crate::solver::evaluate_v1;
    pub use crate::solver_v2::{evaluate_v2, V2Params};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
        assert!(version().starts_with("0."));
    }
}
