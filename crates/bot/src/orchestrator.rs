use crate::metrics::{spawn_metrics_server, SnipeMetrics};
use alloy::primitives::{Address, U256};
use anyhow::Result;
use snipe_chain::{watch_pair_created_with, NodeClient, PairFeed, PairSubscription};
use snipe_core::config::AppConfig;
use snipe_core::dedupe::DedupeCache;
use snipe_core::error::Error;
use snipe_core::types::PairCreatedEvent;
use snipe_core::utils::parse_address;
use snipe_dex::get_pair_address;
use snipe_executor::{BuyReport, NonceManager, SwapExecutor, SwapPolicy};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ties the executor, the factory watch and metrics to one connected client.
pub struct Sniper<'a> {
    client: &'a NodeClient,
    policy: SwapPolicy,
    factory: Address,
    nonces: NonceManager,
    dedup_capacity: usize,
    dedup_ttl_ms: u64,
    metrics: Option<Arc<SnipeMetrics>>,
}

impl<'a> Sniper<'a> {
    pub fn new(cfg: &AppConfig, client: &'a NodeClient) -> Result<Self> {
        let policy = SwapPolicy::from_config(&cfg.dex, &cfg.executor, &cfg.tracker)?;
        let factory = parse_address(&cfg.dex.factory)?;
        let metrics = if cfg.observability.metrics_enabled {
            let metrics = Arc::new(SnipeMetrics::new()?);
            if let Err(err) = spawn_metrics_server(&cfg.observability.metrics_bind, metrics.clone())
            {
                warn!(?err, "metrics server failed to start");
            }
            Some(metrics)
        } else {
            None
        };
        Ok(Self {
            client,
            policy,
            factory,
            nonces: NonceManager::new(0),
            dedup_capacity: cfg.dex.pair_dedup_capacity,
            dedup_ttl_ms: cfg.dex.pair_dedup_ttl_ms,
            metrics,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<SnipeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn executor(&self) -> SwapExecutor<'_> {
        SwapExecutor::new(self.client, &self.nonces, &self.policy)
    }

    pub async fn buy(&self, token: Address, budget: U256) -> snipe_core::Result<BuyReport> {
        let result = self.executor().buy(token, budget).await;
        self.record_buy(&result);
        result
    }

    /// Logs pair creations (all of them, or only those involving `token`)
    /// until the subscription ends.
    pub async fn watch(&self, token: Option<Address>) -> snipe_core::Result<()> {
        let (subscription, mut feed) = self.subscribe_pairs().await?;
        let result = self.follow_pairs(&mut feed, token).await;
        subscription.cancel();
        result
    }

    /// Buys `token` as soon as it trades against the wrapped native
    /// currency: right away if the pair exists, otherwise on its creation.
    pub async fn snipe(&self, token: Address, budget: U256) -> snipe_core::Result<BuyReport> {
        // subscribe first so a pair created during the lookup is not missed
        let (subscription, mut feed) = self.subscribe_pairs().await?;
        let existing = get_pair_address(
            &self.client.provider,
            self.factory,
            self.policy.wrapped_native,
            token,
        )
        .await;
        let pair = match existing {
            Ok(Some(pair)) => {
                info!(%token, %pair, "pair already listed");
                Ok(pair)
            }
            Ok(None) => {
                info!(%token, "waiting for pair creation");
                self.await_pair(&mut feed, token).await.map(|event| event.pair)
            }
            Err(err) => Err(err),
        };
        subscription.cancel();
        let pair = pair.inspect_err(|err| self.record_failure(err))?;
        debug!(%token, %pair, "buying into pair");
        self.buy(token, budget).await
    }

    async fn subscribe_pairs(&self) -> snipe_core::Result<(PairSubscription, PairFeed)> {
        let dedupe = DedupeCache::new(self.dedup_capacity, self.dedup_ttl_ms);
        watch_pair_created_with(&self.client.provider, self.factory, dedupe)
            .await
            .inspect_err(|err| self.record_failure(err))
    }

    async fn follow_pairs(
        &self,
        feed: &mut PairFeed,
        token: Option<Address>,
    ) -> snipe_core::Result<()> {
        while let Some(next) = feed.recv().await {
            let event = match next {
                Ok(event) => event,
                Err(err) => {
                    self.record_failure(&err);
                    return Err(err);
                }
            };
            self.observe_pair();
            if token.is_none_or(|token| event.involves(token)) {
                log_pair(&event);
            }
        }
        Ok(())
    }

    /// Waits for a `[wrapped_native, token]` pair. Pairs of `token` against
    /// other bases are logged and skipped.
    async fn await_pair(
        &self,
        feed: &mut PairFeed,
        token: Address,
    ) -> snipe_core::Result<PairCreatedEvent> {
        while let Some(next) = feed.recv().await {
            let event = next?;
            self.observe_pair();
            match event.counterpart(token) {
                Some(base) if base == self.policy.wrapped_native => {
                    log_pair(&event);
                    return Ok(event);
                }
                Some(base) => {
                    info!(%token, %base, pair = %event.pair, "ignoring pair against other base");
                }
                None => debug!(pair = %event.pair, "unrelated pair"),
            }
        }
        Err(Error::SubscriptionClosed("pair feed ended".to_string()))
    }

    fn observe_pair(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.pairs_observed.inc();
        }
    }

    fn record_buy(&self, result: &snipe_core::Result<BuyReport>) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        match result {
            Ok(report) => {
                metrics.buys_submitted.inc();
                metrics
                    .settlements_total
                    .with_label_values(&[report.settlement.status.as_str()])
                    .inc();
            }
            Err(err) => {
                // the tx was already broadcast when settlement fails
                if matches!(
                    err,
                    Error::SettlementAbort { .. } | Error::SettlementTimeout { .. }
                ) {
                    metrics.buys_submitted.inc();
                }
                metrics.failures_total.with_label_values(&[err.kind()]).inc();
            }
        }
    }

    fn record_failure(&self, err: &Error) {
        if let Some(metrics) = &self.metrics {
            metrics.failures_total.with_label_values(&[err.kind()]).inc();
        }
    }
}

fn log_pair(event: &PairCreatedEvent) {
    info!(
        token0 = %event.token0,
        token1 = %event.token1,
        pair = %event.pair,
        block = event.position.block_number,
        tx = %event.position.transaction_hash,
        "pair created"
    );
}
