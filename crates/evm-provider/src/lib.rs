//! Chain abstraction layer for EVM-compatible blockchains.
//!
//! This crate provides a unified interface for interacting with EVM chains,
//! abstracting away chain-specific quirks and providing a consistent API.
//!
//! # Overview
//!
//! The core of this crate is the [`ChainProvider`] trait, which defines basic
//! blockchain operations (balance queries, transaction sending, etc.). For chains
//! that expose a native block-subscription feed, [`block_stream::BlockStream`]
//! wraps it with a polling fallback and gap-free resume semantics.
//!
//! # Quick Start
//!
//! ```ignore
//! use evm_provider::{ChainProvider, TransactionRequest};
//! use alloy::primitives::{Address, U256};
//!
//! async fn check_balance<P: ChainProvider>(provider: &P, address: Address) {
//!     let balance = provider.get_balance(address).await.unwrap();
//!     println!("Balance: {} wei", balance);
//! }
//! ```
//!
//! # Features
//!
//! - **Chain-agnostic interface**: Same code works with any EVM chain
//! - **Resumable block streaming**: Native subscription with polling fallback
//! - **Thread-safe nonce management**: For high-throughput transaction sending
//! - **Type-safe transactions**: Builder pattern for constructing requests
//!
//! # Modules
//!
//! - [`traits`] - Core [`ChainProvider`] trait
//! - [`types`] - Transaction requests, receipts, and log filters
//! - [`nonce`] - Thread-safe nonce management via [`LocalNonceManager`]
//! - [`standard`] - [`standard::StandardEvmProvider`], the alloy-backed implementation
//! - [`block_stream`] - Resumable, dedup'd block number stream
//! - [`error`] - Error types with detailed context
//!
//! # Architecture
//!
//! This crate follows the ports-and-adapters (hexagonal) architecture:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              Your Application                    │
//! └─────────────────────────────────────────────────┘
//!                        │
//!                        │ uses
//!                        ▼
//! ┌─────────────────────────────────────────────────┐
//! │           ChainProvider trait (Port)            │
//! │  - get_balance()                                │
//! │  - send_raw_transaction()                       │
//! │  - wait_for_receipt()                           │
//! └─────────────────────────────────────────────────┘
//!                        │
//!                        ▼
//! ┌─────────────────────────────────────┐
//! │  StandardEvmProvider (Adapter)      │
//! │  uses: alloy                        │
//! └─────────────────────────────────────┘
//! ```

#![doc(html_root_url = "https://docs.onlyswaps.io/evm-provider")]

// ═══════════════════════════════════════════════════════════════════════════════
// MODULES
// ═══════════════════════════════════════════════════════════════════════════════

pub mod block_stream;
pub mod error;
pub mod mock;
pub mod nonce;
pub mod standard;
pub mod traits;
pub mod types;

// ═══════════════════════════════════════════════════════════════════════════════
// RE-EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

// Primary types - what most users need
pub use block_stream::{BlockStream, BlockTick};
pub use error::{ProviderError, Result};
pub use mock::MockProvider;
pub use nonce::LocalNonceManager;
pub use standard::StandardEvmProvider;
pub use traits::{ChainProvider, NonceManager};
pub use types::{LogFilter, LogsPage, TransactionReceipt, TransactionRequest};

// ═══════════════════════════════════════════════════════════════════════════════
// PRELUDE
// ═══════════════════════════════════════════════════════════════════════════════

/// Convenience re-exports for common use.
///
/// # Usage
///
/// ```ignore
/// use evm_provider::prelude::*;
/// ```
pub mod prelude {
    pub use crate::block_stream::BlockStream;
    pub use crate::error::{ProviderError, Result};
    pub use crate::nonce::LocalNonceManager;
    pub use crate::standard::StandardEvmProvider;
    pub use crate::traits::{ChainProvider, NonceManager};
    pub use crate::types::{LogFilter, LogsPage, TransactionReceipt, TransactionRequest};
}

// ═══════════════════════════════════════════════════════════════════════════════
// CRATE INFO
// ═══════════════════════════════════════════════════════════════════════════════

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
