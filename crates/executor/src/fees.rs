use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use snipe_core::error::Error;
use snipe_core::units::gwei;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPriceSource {
    Suggested,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPrice {
    pub wei: u128,
    pub source: GasPriceSource,
}

/// Legacy gas pricing: the node's suggestion, or a fixed fallback when the
/// suggestion can't be fetched.
#[derive(Debug, Clone)]
pub struct FeeStrategy {
    pub fallback_gas_price_wei: u128,
    pub gas_limit: u64,
}

impl FeeStrategy {
    pub async fn gas_price(&self, provider: &DynProvider) -> GasPrice {
        match provider.get_gas_price().await {
            Ok(wei) => GasPrice {
                wei,
                source: GasPriceSource::Suggested,
            },
            Err(err) => {
                let err = Error::rpc("SuggestGasPrice", err);
                warn!(
                    %err,
                    fallback_gwei = %gwei(self.fallback_gas_price_wei),
                    "gas price query failed; using fallback"
                );
                GasPrice {
                    wei: self.fallback_gas_price_wei,
                    source: GasPriceSource::Fallback,
                }
            }
        }
    }

    pub fn apply(&self, tx: &mut TransactionRequest, gas_price: GasPrice) {
        tx.gas_price = Some(gas_price.wei);
        tx.gas = Some(self.gas_limit);
    }
}
