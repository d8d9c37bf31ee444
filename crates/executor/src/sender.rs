use alloy::eips::eip2718::Encodable2718;
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::B256;
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use snipe_core::error::{Error, Result};
use snipe_core::types::PendingTransaction;
use tracing::{info, warn};

#[derive(Clone)]
pub struct TxSender {
    provider: DynProvider,
}

impl TxSender {
    pub fn new(provider: DynProvider) -> Self {
        Self { provider }
    }

    /// Signs locally. The request must already carry nonce, gas and chain id.
    pub async fn sign(
        wallet: &EthereumWallet,
        tx: TransactionRequest,
    ) -> Result<PendingTransaction> {
        let nonce = tx.nonce.unwrap_or_default();
        let gas_price = tx.gas_price.unwrap_or_default();
        let gas_limit = tx.gas.unwrap_or_default();
        let value = tx.value.unwrap_or_default();
        let envelope = <TransactionRequest as TransactionBuilder<Ethereum>>::build(tx, wallet)
            .await
            .map_err(|err| Error::SubmissionFailed(format!("sign: {err}")))?;
        Ok(PendingTransaction {
            hash: *envelope.tx_hash(),
            nonce,
            gas_price,
            gas_limit,
            value,
            raw: envelope.encoded_2718().into(),
        })
    }

    pub async fn send(&self, pending: &PendingTransaction) -> Result<B256> {
        let sent = self
            .provider
            .send_raw_transaction(&pending.raw)
            .await
            .map_err(|err| Error::SubmissionFailed(format!("SendTransaction: {err}")))?;
        let hash = *sent.tx_hash();
        if hash != pending.hash {
            warn!(%hash, expected = %pending.hash, "node reported a different tx hash");
        }
        info!(%hash, nonce = pending.nonce, "tx broadcast");
        Ok(pending.hash)
    }
}
