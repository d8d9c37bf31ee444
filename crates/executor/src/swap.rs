use crate::fees::{FeeStrategy, GasPrice};
use crate::nonce::NonceManager;
use crate::sender::TxSender;
use crate::settlement::ConfirmationTracker;
use crate::tx_builder::{BuyEthParams, SwapTxBuilder};
use alloy::primitives::{Address, U256};
use snipe_chain::{LogFeed, NodeClient};
use snipe_core::config::{DexConfig, ExecutorConfig, TrackerConfig};
use snipe_core::error::Result;
use snipe_core::types::{PendingTransaction, Quote, Settlement, SettlementStatus};
use snipe_core::units::{gwei, to_display_unit, to_display_unit_with};
use snipe_core::utils::{now_secs, parse_address};
use snipe_dex::quote::{get_amounts_out, min_amount_out};
use snipe_dex::token::holdings;
use snipe_dex::TokenHoldings;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SwapPolicy {
    pub router: Address,
    pub wrapped_native: Address,
    pub fees: FeeStrategy,
    pub max_slippage_bps: u32,
    pub deadline_secs: u64,
    pub settlement_timeout: Option<Duration>,
}

impl SwapPolicy {
    pub fn from_config(
        dex: &DexConfig,
        executor: &ExecutorConfig,
        tracker: &TrackerConfig,
    ) -> Result<Self> {
        Ok(Self {
            router: parse_address(&dex.router)?,
            wrapped_native: parse_address(&dex.wrapped_native)?,
            fees: FeeStrategy {
                fallback_gas_price_wei: u128::from(executor.fallback_gas_price_wei),
                gas_limit: executor.gas_limit,
            },
            max_slippage_bps: executor.max_slippage_bps,
            deadline_secs: executor.deadline_secs,
            settlement_timeout: (tracker.settlement_timeout_ms > 0)
                .then(|| Duration::from_millis(tracker.settlement_timeout_ms)),
        })
    }

    pub fn path_to(&self, token: Address) -> Vec<Address> {
        vec![self.wrapped_native, token]
    }
}

/// Everything decided before signing: nonce, gas, quote and the output
/// bound. The deadline is stamped by `sign`.
#[derive(Debug, Clone)]
pub struct SwapPlan {
    pub token: Address,
    pub budget: U256,
    pub nonce: u64,
    pub gas_price: GasPrice,
    pub quote: Quote,
    pub min_amount_out: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuyOutcome {
    /// Swap executed. Holdings are best-effort; a failed lookup is kept as
    /// `reporting_error` instead.
    Filled {
        holdings: Option<TokenHoldings>,
        reporting_error: Option<String>,
    },
    Reverted,
}

impl BuyOutcome {
    /// The caller's token balance after the buy, which includes anything
    /// held before it. `None` when the lookup failed.
    pub fn balance(&self) -> Option<U256> {
        match self {
            BuyOutcome::Filled { holdings, .. } => holdings.as_ref().map(|h| h.balance),
            BuyOutcome::Reverted => Some(U256::ZERO),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuyReport {
    pub token: Address,
    pub spent: U256,
    pub quote: Quote,
    pub min_amount_out: U256,
    pub tx: PendingTransaction,
    pub settlement: Settlement,
    pub outcome: BuyOutcome,
}

/// Runs single native-currency buys against the configured router using the
/// caller's connection and nonce sequence.
pub struct SwapExecutor<'a> {
    client: &'a NodeClient,
    nonces: &'a NonceManager,
    policy: &'a SwapPolicy,
}

impl<'a> SwapExecutor<'a> {
    pub fn new(client: &'a NodeClient, nonces: &'a NonceManager, policy: &'a SwapPolicy) -> Self {
        Self {
            client,
            nonces,
            policy,
        }
    }

    fn builder(&self) -> SwapTxBuilder {
        SwapTxBuilder::new(
            self.policy.router,
            self.client.address(),
            self.client.identity().chain_id(),
            self.policy.fees.clone(),
        )
    }

    fn tracker(&self) -> ConfirmationTracker {
        ConfirmationTracker::new(self.client.provider.clone(), self.policy.settlement_timeout)
    }

    /// Reserves a nonce, prices gas and quotes the path. The nonce goes back
    /// to the pool if any later step fails.
    pub async fn prepare(&self, token: Address, budget: U256) -> Result<SwapPlan> {
        let nonce = self
            .nonces
            .reserve(&self.client.provider, self.client.address())
            .await?;
        match self.plan(token, budget, nonce).await {
            Ok(plan) => Ok(plan),
            Err(err) => {
                self.nonces.release(nonce);
                Err(err)
            }
        }
    }

    async fn plan(&self, token: Address, budget: U256, nonce: u64) -> Result<SwapPlan> {
        let provider = &self.client.provider;
        let gas_price = self.policy.fees.gas_price(provider).await;
        info!(
            nonce,
            gas_gwei = %gwei(gas_price.wei),
            source = ?gas_price.source,
            "gas price"
        );

        let quote = get_amounts_out(
            provider,
            self.policy.router,
            self.client.address(),
            budget,
            self.policy.path_to(token),
        )
        .await?;
        let min_amount_out = min_amount_out(&quote, self.policy.max_slippage_bps)?;
        info!(
            amounts = ?quote.amounts,
            %min_amount_out,
            "quoted"
        );

        Ok(SwapPlan {
            token,
            budget,
            nonce,
            gas_price,
            quote,
            min_amount_out,
        })
    }

    /// Signs the swap with a deadline of `deadline_secs` from now.
    pub async fn sign(&self, plan: &SwapPlan) -> Result<PendingTransaction> {
        let params = BuyEthParams {
            path: plan.quote.path.clone(),
            amount_in: plan.budget,
            min_amount_out: plan.min_amount_out,
            recipient: self.client.address(),
            deadline: U256::from(now_secs() + self.policy.deadline_secs),
        };
        let tx = self.builder().build_buy_eth(params, plan.nonce, plan.gas_price);
        TxSender::sign(&self.client.identity().wallet(), tx).await
    }

    pub async fn buy(&self, token: Address, budget: U256) -> Result<BuyReport> {
        info!(%token, amount = %to_display_unit(budget), "buying");
        let plan = self.prepare(token, budget).await?;

        let signed = async {
            let feed = self.tracker().watch(token).await?;
            let pending = self.sign(&plan).await?;
            Ok::<_, snipe_core::Error>((feed, pending))
        }
        .await;
        let (feed, pending) = match signed {
            Ok(signed) => signed,
            Err(err) => {
                self.nonces.release(plan.nonce);
                return Err(err);
            }
        };
        self.submit(plan, pending, feed).await
    }

    /// Broadcasts `pending` and follows it through `feed`, which must
    /// already be open on the plan's token. The nonce is released only if
    /// the broadcast itself fails.
    pub async fn submit(
        &self,
        plan: SwapPlan,
        pending: PendingTransaction,
        feed: LogFeed,
    ) -> Result<BuyReport> {
        if let Err(err) = TxSender::new(self.client.provider.clone())
            .send(&pending)
            .await
        {
            self.nonces.release(plan.nonce);
            return Err(err);
        }
        info!(hash = %pending.hash, "tx pending");

        let settlement = self.tracker().settle(feed, pending.hash).await?;
        Ok(self.conclude(plan, pending, settlement).await)
    }

    async fn conclude(
        &self,
        plan: SwapPlan,
        tx: PendingTransaction,
        settlement: Settlement,
    ) -> BuyReport {
        let outcome = match settlement.status {
            SettlementStatus::Reverted => {
                warn!(hash = %tx.hash, "swap reverted");
                BuyOutcome::Reverted
            }
            SettlementStatus::Succeeded => {
                match holdings(&self.client.provider, plan.token, self.client.address()).await {
                    Ok(held) => {
                        info!(
                            token = %held.name,
                            balance = %to_display_unit_with(held.balance, held.decimals),
                            "balance"
                        );
                        BuyOutcome::Filled {
                            holdings: Some(held),
                            reporting_error: None,
                        }
                    }
                    Err(err) => {
                        warn!(%err, "swap filled but holdings lookup failed");
                        BuyOutcome::Filled {
                            holdings: None,
                            reporting_error: Some(err.to_string()),
                        }
                    }
                }
            }
        };
        BuyReport {
            token: plan.token,
            spent: plan.budget,
            quote: plan.quote,
            min_amount_out: plan.min_amount_out,
            tx,
            settlement,
            outcome,
        }
    }
}
