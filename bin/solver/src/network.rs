//! Chain Client: binds one RPC endpoint, one signer, and one Router/ERC20
//! address set to a single chain ID.
//!
//! Reads (balances, unfulfilled/fulfilled request IDs, parameter reconciliation)
//! go through [`evm_provider::ChainProvider`]'s raw `call` - the same path
//! `router_contracts::decode` exists to make robust against either ABI shape a
//! deployed Router might return. Writes (`approve`, `relayTokens`) go through a
//! separate, fully-filled `alloy` provider bound to the solver's signer, since
//! signing and nonce/gas filling are exactly what that stack is for.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use evm_provider::{BlockStream, ChainProvider, StandardEvmProvider, TransactionRequest};
use router_contracts::abi::{IERC20, IRouter};
use router_contracts::decode::decode_swap_request_parameters;
use router_contracts::selectors::decode_revert_selector;
use solver_core::model::normalize_chain_id;
use solver_core::{ChainState, RequestId, SwapRequestParameters, Trade, Transfer};
use tracing::{instrument, warn};

use crate::config::NetworkConfig;
use crate::error::{Result, SolverAppError};

/// One chain's bound provider, signer, and contract addresses.
#[derive(Clone)]
pub struct ChainClient {
    chain_id: u64,
    address: Address,
    router_address: Address,
    tokens: Vec<Address>,
    read_provider: Arc<StandardEvmProvider>,
    rpc: DynProvider,
    tx_gas_buffer: u64,
    tx_gas_price_buffer: u64,
    gas_price_wei_override: Option<u128>,
}

impl ChainClient {
    /// Connect to the chain described by `config`, signing with `signer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC URL is invalid or the initial connection
    /// (including the chain-ID handshake) fails.
    pub async fn connect(config: &NetworkConfig, signer: PrivateKeySigner) -> Result<Self> {
        let address = signer.address();

        let read_provider = Arc::new(StandardEvmProvider::new(&config.rpc_url).await.map_err(|source| {
            SolverAppError::Provider { chain_id: config.chain_id, source }
        })?);

        let url: reqwest::Url = config
            .rpc_url
            .parse()
            .map_err(|e| SolverAppError::Internal(format!("invalid RPC URL {}: {e}", config.rpc_url)))?;

        let wallet = EthereumWallet::from(signer);
        let rpc = ProviderBuilder::new().wallet(wallet).connect_http(url).erased();

        Ok(Self {
            chain_id: config.chain_id,
            address,
            router_address: config.router_address,
            tokens: config.tokens.clone(),
            read_provider,
            rpc,
            tx_gas_buffer: config.tx_gas_buffer,
            tx_gas_price_buffer: config.tx_gas_price_buffer,
            gas_price_wei_override: config.gas_price_wei_override,
        })
    }

    /// Chain ID this client is bound to.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The solver's signing address on this chain.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Whether `token` is one of this chain's configured inventory tokens.
    #[must_use]
    pub fn holds_token(&self, token: Address) -> bool {
        self.tokens.contains(&token)
    }

    /// A resumable block-number stream for this chain's read provider.
    #[must_use]
    pub fn block_stream(&self, resume_from: Option<u64>) -> BlockStream<StandardEvmProvider> {
        BlockStream::new(Arc::clone(&self.read_provider), resume_from)
    }

    /// Fetch this chain's full state: inventory plus unfulfilled transfers.
    ///
    /// Implements the five-step read: native balance, each tracked token's
    /// balance, already-fulfilled request IDs, unfulfilled request IDs, and
    /// per-request reconciliation of the latter against live parameters.
    #[instrument(skip(self), fields(chain_id = self.chain_id))]
    pub async fn fetch_state(&self) -> Result<ChainState> {
        let native_balance = self
            .read_provider
            .get_balance(self.address)
            .await
            .map_err(|source| SolverAppError::Provider { chain_id: self.chain_id, source })?;

        let mut token_balances = HashMap::with_capacity(self.tokens.len());
        for &token in &self.tokens {
            let balance = self
                .read_provider
                .get_token_balance(token, self.address)
                .await
                .map_err(|source| SolverAppError::Provider { chain_id: self.chain_id, source })?;
            token_balances.insert(token, balance);
        }

        let already_fulfilled: HashSet<RequestId> = self
            .call_returning_ids(IRouter::getFulfilledTransfersCall {})
            .await?
            .into_iter()
            .map(RequestId::from_bytes)
            .collect();

        let unfulfilled_ids = self.call_returning_ids(IRouter::getUnfulfilledSolverRefundsCall {}).await?;

        let mut transfers = Vec::with_capacity(unfulfilled_ids.len());
        for request_id in unfulfilled_ids {
            match self.reconcile(request_id).await {
                Ok(Some(transfer)) => transfers.push(transfer),
                Ok(None) => {}
                Err(e) => warn!(
                    chain_id = self.chain_id,
                    request_id = %RequestId::from_bytes(request_id),
                    error = %e,
                    "skipping transfer: reconciliation failed",
                ),
            }
        }

        Ok(ChainState { native_balance, token_balances, transfers, already_fulfilled })
    }

    /// Re-fetch one request's parameters directly from the Router, the way
    /// the Executor does immediately before relaying to catch a settlement
    /// that happened elsewhere since this chain's last `fetch_state`.
    ///
    /// Returns `Ok(None)` for an empty/unknown request ID.
    pub async fn reconcile(&self, request_id: B256) -> Result<Option<Transfer>> {
        let call = IRouter::getSwapRequestParametersCall { requestId: request_id };
        let data = self.raw_call(self.router_address, call.abi_encode().into()).await?;
        let decoded = decode_swap_request_parameters(&data).map_err(solver_core::SolverError::from)?;

        if decoded.is_empty {
            return Ok(None);
        }

        let params = SwapRequestParameters {
            src_chain_id: decoded.src_chain_id,
            dst_chain_id: decoded.dst_chain_id,
            sender: decoded.sender,
            recipient: decoded.recipient,
            token_in: decoded.token_in,
            token_out: decoded.token_out,
            amount_out: decoded.amount_out,
            verification_fee: decoded.verification_fee,
            solver_fee: decoded.solver_fee,
            nonce: decoded.nonce,
            executed: decoded.executed,
            requested_at: decoded.requested_at,
        };

        Ok(Some(Transfer {
            request_id: RequestId::from_bytes(request_id),
            params,
            conditions: Vec::new(),
            priority: None,
        }))
    }

    /// Approve the Router to pull `amount` of `token` from the solver's wallet.
    #[instrument(skip(self), fields(chain_id = self.chain_id))]
    pub async fn approve(&self, token: Address, amount: alloy::primitives::U256) -> Result<B256> {
        let erc20 = IERC20::new(token, self.rpc.clone());
        let call = erc20.approve(self.router_address, amount);
        let gas = self.buffered_gas(call.estimate_gas().await.map_err(|e| {
            SolverAppError::Internal(format!("approve gas estimate failed: {e}"))
        })?);

        let pending = call
            .gas(gas)
            .send()
            .await
            .map_err(|e| map_send_error(self.chain_id, &e))?;

        Ok(*pending.tx_hash())
    }

    /// Relay `trade` on this (the destination) chain.
    #[instrument(skip(self, trade), fields(chain_id = self.chain_id, request_id = %trade.request_id))]
    pub async fn relay(&self, trade: &Trade) -> Result<B256> {
        let router = IRouter::new(self.router_address, self.rpc.clone());
        let call = router.relayTokens(
            self.address,
            *trade.request_id.as_bytes(),
            trade.sender_addr,
            trade.recipient_addr,
            trade.token_in_addr,
            trade.token_out_addr,
            trade.swap_amount,
            alloy::primitives::U256::from(trade.src_chain_id),
            trade.nonce,
        );

        let gas = self.buffered_gas(
            call.estimate_gas().await.map_err(|e| SolverAppError::Internal(format!("relay gas estimate failed: {e}")))?,
        );

        let pending = call
            .gas(gas)
            .send()
            .await
            .map_err(|e| map_send_error(self.chain_id, &e))?;

        Ok(*pending.tx_hash())
    }

    /// Wait for a transaction's receipt, returning whether it succeeded.
    pub async fn wait_for_receipt(&self, tx_hash: B256, timeout: Duration) -> Result<bool> {
        let receipt = self
            .read_provider
            .wait_for_receipt(tx_hash, timeout)
            .await
            .map_err(|source| SolverAppError::Provider { chain_id: self.chain_id, source })?;
        Ok(receipt.success)
    }

    /// Scale an estimated gas figure by this chain's configured buffer.
    fn buffered_gas(&self, estimate: u64) -> u64 {
        apply_percentage(estimate, self.tx_gas_buffer)
    }

    /// Read-only call against the Router returning a `bytes32[]`, for the two
    /// request-ID listing calls that share this return shape.
    async fn call_returning_ids<C: SolCall<Return = Vec<B256>>>(&self, call: C) -> Result<Vec<B256>> {
        let data = self.raw_call(self.router_address, call.abi_encode().into()).await?;
        C::abi_decode_returns(&data)
            .map_err(|e| SolverAppError::Internal(format!("failed to decode Router return data: {e}")))
    }

    async fn raw_call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let request = TransactionRequest::new().to(to).data(data);
        self.read_provider
            .call(&request)
            .await
            .map_err(|source| SolverAppError::Provider { chain_id: self.chain_id, source })
    }

    /// Gas price to quote for planning, honoring a configured override.
    pub async fn gas_price_wei(&self) -> Result<u128> {
        if let Some(override_wei) = self.gas_price_wei_override {
            return Ok(override_wei);
        }
        let price = self
            .read_provider
            .gas_price()
            .await
            .map_err(|source| SolverAppError::Provider { chain_id: self.chain_id, source })?;
        Ok(price.saturating_mul(u128::from(self.tx_gas_price_buffer)) / 100)
    }
}

/// Scale `value` by `percentage`, e.g. `apply_percentage(100_000, 120) == 120_000`.
fn apply_percentage(value: u64, percentage: u64) -> u64 {
    value.saturating_mul(percentage) / 100
}

/// Turn a failed `.send()` into a `Reverted` error when the node returned
/// revert data, decoding the selector where it's one of the Router's known
/// ones, or a plain `Internal` error for transport-level failures.
fn map_send_error(chain_id: u64, error: &alloy::contract::Error) -> SolverAppError {
    let Some(data) = error.as_revert_data() else {
        return SolverAppError::Internal(format!("transaction send failed: {error}"));
    };
    let revert = decode_revert_selector(&data);
    let reason = revert.map_or_else(
        || "revert data did not match a known Router selector".to_string(),
        |r| r.to_string(),
    );
    SolverAppError::Reverted { chain_id, reason, revert }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_gas_applies_percentage() {
        assert_eq!(apply_percentage(100_000, 120), 120_000);
    }

    #[test]
    fn buffered_gas_no_buffer_is_identity() {
        assert_eq!(apply_percentage(100_000, 100), 100_000);
    }
}
