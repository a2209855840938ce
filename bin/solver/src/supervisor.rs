//! The Loop Supervisor: owns every chain client, the State Store, the
//! evaluator, and the Executor, and drives the fetch -> evaluate -> execute
//! loop off block arrivals fanned in from every configured chain.
//!
//! Structurally this mirrors `FleetService::run`'s tick loop, except a tick
//! here is "a new block landed on chain C" rather than a fixed interval, and
//! only chain C's state is refreshed before the whole State Store is
//! re-evaluated - re-reading every chain on every single chain's block would
//! multiply RPC load for no benefit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use evm_provider::BlockTick;
use solver_core::condition::{PriceCache, PriceOracle, PRICE_CACHE_TTL};
use solver_core::profit::{GasPriceCache, GAS_PRICE_CACHE_TTL};
use solver_core::{evaluate_v1, evaluate_v2, InFlightCache, StateStore, Trade, V2Params};
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::executor::Executor;
use crate::network::ChainClient;

/// Price oracle stand-in until a real feed is wired up: every lookup fails,
/// which per `condition.rs`'s fail-closed rule simply drops any transfer
/// gated by a `price` condition rather than letting it through unchecked.
struct NoopPriceOracle;

#[async_trait::async_trait]
impl PriceOracle for NoopPriceOracle {
    async fn fetch_price(
        &self,
        _token: alloy::primitives::Address,
        _chain_id: u64,
        _source: &str,
    ) -> std::result::Result<alloy::primitives::U256, String> {
        Err("no price oracle configured".into())
    }
}

enum Evaluator {
    V1,
    V2(V2Params),
}

/// Ties per-chain clients, the shared State Store, the chosen evaluator, and
/// the Executor into one running loop.
pub struct Supervisor {
    chains: HashMap<u64, ChainClient>,
    state: StateStore,
    inflight: Arc<InFlightCache>,
    evaluator: Evaluator,
    executor: Arc<Executor>,
    oracle: NoopPriceOracle,
    price_cache: PriceCache,
    gas_price_cache: GasPriceCache,
}

impl Supervisor {
    /// Build a supervisor and prime every chain's State Store entry with one
    /// initial `fetch_state` call before the main loop starts.
    ///
    /// # Errors
    ///
    /// Returns an error if priming any chain's initial state fails.
    pub async fn new(settings: &Settings, chains: HashMap<u64, ChainClient>, dry_run: bool) -> Result<Self> {
        let inflight = Arc::new(InFlightCache::new(settings.agent.inflight_capacity));
        let ttl = Duration::from_secs(settings.agent.inflight_ttl_secs);
        let executor = Arc::new(Executor::new(chains.clone(), Arc::clone(&inflight), ttl, dry_run));

        let evaluator = match settings.agent.evaluator.as_str() {
            "v2" => Evaluator::V2(V2Params::default()),
            _ => Evaluator::V1,
        };

        let mut state = StateStore::new();
        for (&chain_id, client) in &chains {
            let chain_state = client.fetch_state().await?;
            info!(chain_id, transfers = chain_state.transfers.len(), "primed chain state");
            state.insert(chain_id, chain_state);
        }

        Ok(Self {
            chains,
            state,
            inflight,
            evaluator,
            executor,
            oracle: NoopPriceOracle,
            price_cache: PriceCache::new(PRICE_CACHE_TTL),
            gas_price_cache: GasPriceCache::new(GAS_PRICE_CACHE_TTL),
        })
    }

    /// Run the main loop until `shutdown` resolves, or every chain's block
    /// stream closes (e.g. all RPC connections lost for good).
    ///
    /// # Errors
    ///
    /// This currently always returns `Ok`; the signature returns `Result`
    /// so a future fatal-error path (e.g. all chains unreachable at once)
    /// can propagate without a breaking change.
    pub async fn run(mut self, shutdown: impl std::future::Future<Output = ()>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(256);

        for (&chain_id, client) in &self.chains {
            let tx = tx.clone();
            let mut stream = client.block_stream(None).spawn();
            tokio::spawn(async move {
                while let Some(tick) = stream.recv().await {
                    debug_assert_eq!(tick.chain_id, chain_id);
                    if tx.send(tick).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutdown signal received, stopping supervisor");
                    break;
                }
                tick = rx.recv() => {
                    match tick {
                        Some(tick) => self.on_tick(tick).await,
                        None => {
                            warn!("all chain block streams closed, stopping supervisor");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    #[instrument(skip(self, tick), fields(chain_id = tick.chain_id, block_number = tick.block_number))]
    async fn on_tick(&mut self, tick: BlockTick) {
        let chain_id = tick.chain_id;
        let Some(client) = self.chains.get(&chain_id) else {
            warn!(chain_id, "tick for unknown chain, ignoring");
            return;
        };

        match client.fetch_state().await {
            Ok(chain_state) => {
                self.state.insert(chain_id, chain_state);
            }
            Err(e) => {
                error!(chain_id, error = %e, "failed to refresh chain state, skipping tick");
                return;
            }
        }

        let trades = self.evaluate(chain_id).await;
        let emitted = trades.len();

        // Trades run one at a time, not concurrently: every chain shares a
        // single signer, and a concurrent approve/relay pair racing on the
        // same nonce would corrupt each other's transactions.
        let mut failed = 0;
        for trade in &trades {
            if let Err(e) = self.executor.execute(trade).await {
                error!(request_id = %trade.request_id, error = %e, "trade execution failed");
                failed += 1;
            }
        }

        info!(
            chain_id,
            block_number = tick.block_number,
            trades_emitted = emitted,
            trades_executed = emitted - failed,
            trades_failed = failed,
            "tick complete"
        );
    }

    async fn evaluate(&mut self, chain_id: u64) -> Vec<Trade> {
        match self.evaluator {
            Evaluator::V1 => evaluate_v1(chain_id, &mut self.state, &self.inflight),
            Evaluator::V2(params) => {
                evaluate_v2(
                    chain_id,
                    &mut self.state,
                    &self.inflight,
                    &self.oracle,
                    &self.price_cache,
                    &self.gas_price_cache,
                    params,
                )
                .await
            }
        }
    }
}
