//! The Executor: turns one committed [`Trade`] into on-chain transactions.
//!
//! Sequence per trade, all inside a single combined deadline:
//! in-flight check, in-flight set (before any network call), reconcile the
//! request's live parameters against the destination Router (catching a
//! settlement that happened elsewhere since the evaluator ran), rebuild the
//! trade from those reconciled parameters rather than the evaluator-time
//! ones, check the reconciled `token_out` against this chain's configured
//! inventory, approve the Router to pull it, wait for the approval receipt,
//! a short settle delay, relay, wait for the relay receipt. A failure at any
//! step deletes the in-flight entry so a later tick can retry; success
//! leaves the entry in place until its TTL expires, which is what stops the
//! same request from being relayed again the instant the in-flight cache
//! would otherwise allow it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use solver_core::{InFlightCache, RequestId, Trade};
use tracing::{info, instrument, warn};

use crate::error::{Result, SolverAppError};
use crate::network::ChainClient;

/// Combined deadline for reconcile + approve + relay, per trade.
pub const TRADE_DEADLINE: Duration = Duration::from_secs(10);

/// Delay between a confirmed approval and submitting the relay, giving an
/// RPC node a moment to observe the new allowance before the relay call
/// reads it.
const POST_APPROVE_DELAY: Duration = Duration::from_millis(500);

/// Executes settlement decisions against destination chains, with in-flight
/// bookkeeping so the same request is never relayed twice concurrently.
pub struct Executor {
    chains: HashMap<u64, ChainClient>,
    inflight: Arc<InFlightCache>,
    inflight_ttl: Duration,
    dry_run: bool,
}

impl Executor {
    /// Build an executor over the given per-chain clients.
    ///
    /// When `dry_run` is set, [`Self::execute`] logs the approve/relay it
    /// would have submitted instead of sending either transaction - an
    /// operational safety valve for running against real chains without
    /// risking solver inventory.
    #[must_use]
    pub fn new(
        chains: HashMap<u64, ChainClient>,
        inflight: Arc<InFlightCache>,
        inflight_ttl: Duration,
        dry_run: bool,
    ) -> Self {
        Self { chains, inflight, inflight_ttl, dry_run }
    }

    /// Settle `trade`, or report why it couldn't be settled this attempt.
    ///
    /// Never leaves the in-flight cache holding an entry for a trade this
    /// call did not actually commit to relaying: a pre-existing entry means
    /// this call returns immediately without touching the cache, and every
    /// other exit path either leaves a freshly-set entry behind (success) or
    /// removes it again (failure).
    #[instrument(skip(self, trade), fields(request_id = %trade.request_id, dest_chain_id = trade.dest_chain_id))]
    pub async fn execute(&self, trade: &Trade) -> Result<()> {
        if self.inflight.has(trade.request_id) {
            info!("trade already in flight, skipping");
            return Ok(());
        }

        self.inflight.set(trade.request_id, self.inflight_ttl);

        match self.settle(trade).await {
            Ok(()) => {
                info!("trade settled");
                Ok(())
            }
            Err(e) => {
                log_failure(trade.request_id, &e);
                self.inflight.delete(trade.request_id);
                Err(e)
            }
        }
    }

    async fn settle(&self, trade: &Trade) -> Result<()> {
        let deadline = Instant::now() + TRADE_DEADLINE;

        let dest = self
            .chains
            .get(&trade.dest_chain_id)
            .ok_or(SolverAppError::UnknownChain(trade.dest_chain_id))?;

        let request_id = *trade.request_id.as_bytes();
        let transfer = match with_deadline(deadline, dest.reconcile(request_id)).await? {
            None => {
                return Err(SolverAppError::Internal(
                    "request no longer present on destination chain".into(),
                ))
            }
            Some(transfer) if transfer.params.executed => {
                info!("request already executed on destination chain, nothing to do");
                return Ok(());
            }
            Some(transfer) => transfer,
        };

        // Settle against the Router's just-reconciled parameters, not the
        // evaluator-time `trade` - the two can diverge if the request was
        // amended or re-verified on-chain since the evaluator last ran.
        let verified = Trade::from_transfer(&transfer);

        if !dest.holds_token(verified.token_out_addr) {
            return Err(SolverAppError::Internal(format!(
                "token {:#x} is not configured for chain {}",
                verified.token_out_addr, verified.dest_chain_id
            )));
        }

        if self.dry_run {
            info!(
                token_out = %verified.token_out_addr,
                amount = %verified.swap_amount,
                "dry run: would approve and relay this trade, submitting nothing"
            );
            return Ok(());
        }

        let approve_tx =
            with_deadline(deadline, dest.approve(verified.token_out_addr, verified.swap_amount)).await?;
        let approved = with_deadline(deadline, dest.wait_for_receipt(approve_tx, remaining(deadline))).await?;
        if !approved {
            return Err(SolverAppError::Internal(format!("approval transaction {approve_tx:#x} reverted")));
        }

        tokio::time::sleep(POST_APPROVE_DELAY.min(remaining(deadline))).await;

        let relay_tx = with_deadline(deadline, dest.relay(&verified)).await?;
        let relayed = with_deadline(deadline, dest.wait_for_receipt(relay_tx, remaining(deadline))).await?;
        if !relayed {
            return Err(SolverAppError::Internal(format!("relay transaction {relay_tx:#x} reverted")));
        }

        Ok(())
    }
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

async fn with_deadline<T>(deadline: Instant, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout_at(deadline.into(), fut)
        .await
        .map_err(|_| SolverAppError::Internal("trade deadline exceeded".into()))?
}

fn log_failure(request_id: RequestId, error: &SolverAppError) {
    if let SolverAppError::Reverted { revert: Some(revert), .. } = error {
        if revert.is_already_settled() {
            info!(%request_id, revert = %revert, "another solver settled this request first");
            return;
        }
        warn!(%request_id, revert = %revert, "relay reverted");
        return;
    }
    warn!(%request_id, error = %error, "trade execution failed, releasing in-flight entry for retry");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn remaining_saturates_at_zero_past_deadline() {
        let deadline = Instant::now() - Duration::from_secs(1);
        assert_eq!(remaining(deadline), Duration::ZERO);
    }

    #[tokio::test]
    async fn execute_skips_when_already_in_flight() {
        let inflight = Arc::new(InFlightCache::default());
        let trade = sample_trade();
        inflight.set_default(trade.request_id);

        let executor = Executor::new(HashMap::new(), Arc::clone(&inflight), Duration::from_secs(30), false);
        let result = executor.execute(&trade).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn execute_fails_and_releases_entry_for_unknown_chain() {
        let inflight = Arc::new(InFlightCache::default());
        let trade = sample_trade();

        let executor = Executor::new(HashMap::new(), Arc::clone(&inflight), Duration::from_secs(30), false);
        let result = executor.execute(&trade).await;

        assert!(result.is_err());
        assert!(!inflight.has(trade.request_id));
    }

    #[tokio::test]
    async fn dry_run_fails_before_reaching_network_since_chain_is_unknown() {
        // Dry-run still requires a reconcile against the destination chain;
        // an unconfigured chain fails before the dry-run short-circuit is
        // ever reached, exactly as it would for a live run.
        let inflight = Arc::new(InFlightCache::default());
        let trade = sample_trade();

        let executor = Executor::new(HashMap::new(), Arc::clone(&inflight), Duration::from_secs(30), true);
        let result = executor.execute(&trade).await;

        assert!(result.is_err());
    }

    fn sample_trade() -> Trade {
        use alloy::primitives::{Address, B256, U256};

        Trade {
            request_id: RequestId::from_bytes(B256::repeat_byte(0x42)),
            nonce: U256::from(1u64),
            token_in_addr: Address::repeat_byte(0x01),
            token_out_addr: Address::repeat_byte(0x02),
            src_chain_id: 1,
            dest_chain_id: 999,
            sender_addr: Address::repeat_byte(0x03),
            recipient_addr: Address::repeat_byte(0x04),
            swap_amount: U256::from(1_000u64),
        }
    }
}
