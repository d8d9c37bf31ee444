use alloy::primitives::{Address, B256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::{Filter, TransactionReceipt};
use snipe_chain::{FeedEvent, LogFeed};
use snipe_core::error::{Error, Result};
use snipe_core::types::{Settlement, SettlementStatus};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Follows a submitted transaction to its receipt by watching the target
/// token's logs for the transaction hash.
#[derive(Clone)]
pub struct ConfirmationTracker {
    provider: DynProvider,
    timeout: Option<Duration>,
}

impl ConfirmationTracker {
    pub fn new(provider: DynProvider, timeout: Option<Duration>) -> Self {
        Self { provider, timeout }
    }

    pub fn from_timeout_ms(provider: DynProvider, timeout_ms: u64) -> Self {
        let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        Self::new(provider, timeout)
    }

    /// Opens the log subscription for `token`. Open it before broadcasting
    /// so the first matching log can't slip past.
    pub async fn watch(&self, token: Address) -> Result<LogFeed> {
        LogFeed::subscribe(&self.provider, Filter::new().address(token)).await
    }

    pub async fn await_settlement(&self, token: Address, tx_hash: B256) -> Result<Settlement> {
        let feed = self.watch(token).await?;
        self.settle(feed, tx_hash).await
    }

    pub async fn settle(&self, mut feed: LogFeed, tx_hash: B256) -> Result<Settlement> {
        let observed = match self.timeout {
            None => wait_for_log(&mut feed, tx_hash).await?,
            Some(limit) => match tokio::time::timeout(limit, wait_for_log(&mut feed, tx_hash)).await
            {
                Ok(observed) => observed?,
                Err(_) => {
                    drop(feed);
                    // reverted swaps emit no token logs, so ask once before giving up
                    warn!(%tx_hash, ?limit, "no matching log before deadline; checking receipt");
                    return match self.lookup(tx_hash, 0).await? {
                        Some(settlement) => Ok(settlement),
                        None => Err(Error::SettlementTimeout {
                            hash: tx_hash,
                            waited: limit,
                        }),
                    };
                }
            },
        };
        drop(feed);

        let settlement = self
            .lookup(tx_hash, observed)
            .await?
            .ok_or_else(|| Error::rpc("TransactionReceipt", "receipt not found"))?;
        info!(
            %tx_hash,
            status = settlement.status.as_str(),
            block = ?settlement.block_number,
            gas_used = settlement.gas_used,
            "tx settled"
        );
        Ok(settlement)
    }

    async fn lookup(&self, tx_hash: B256, observed: usize) -> Result<Option<Settlement>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|err| Error::rpc("TransactionReceipt", err))?;
        Ok(receipt.map(|receipt| classify(&receipt, observed)))
    }
}

/// Consumes the feed until a log from `tx_hash` arrives and returns how many
/// events were read, the match included. A closed feed aborts the wait.
pub async fn wait_for_log(feed: &mut LogFeed, tx_hash: B256) -> Result<usize> {
    let mut observed = 0usize;
    loop {
        match feed.next_event().await {
            FeedEvent::Log(log) => {
                observed += 1;
                if !log.removed && log.transaction_hash == Some(tx_hash) {
                    debug!(%tx_hash, observed, "matched settlement log");
                    return Ok(observed);
                }
            }
            FeedEvent::Closed(reason) => {
                return Err(Error::SettlementAbort {
                    hash: tx_hash,
                    reason,
                })
            }
        }
    }
}

pub fn classify(receipt: &TransactionReceipt, logs_observed: usize) -> Settlement {
    let status = if receipt.inner.status() {
        SettlementStatus::Succeeded
    } else {
        SettlementStatus::Reverted
    };
    Settlement {
        tx_hash: receipt.transaction_hash,
        status,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
        logs_observed,
    }
}
