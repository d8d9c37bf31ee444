use crate::abi::IUniswapV2Factory;
use alloy::primitives::{Address, TxKind};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::transaction::TransactionInput;
use alloy::rpc::types::{Log, TransactionRequest};
use alloy::sol_types::SolCall;
use snipe_core::error::{Error, Result};
use snipe_core::types::{LogPosition, PairCreatedEvent};

pub async fn get_pair_address(
    provider: &DynProvider,
    factory: Address,
    token_a: Address,
    token_b: Address,
) -> Result<Option<Address>> {
    let call = IUniswapV2Factory::getPairCall {
        tokenA: token_a,
        tokenB: token_b,
    };
    let tx = TransactionRequest {
        to: Some(TxKind::Call(factory)),
        input: TransactionInput::new(call.abi_encode().into()),
        ..Default::default()
    };
    let data = provider
        .call(tx)
        .await
        .map_err(|err| Error::rpc("getPair", err))?;
    let ret = IUniswapV2Factory::getPairCall::abi_decode_returns(&data)
        .map_err(|err| Error::rpc("getPair", err))?;
    if ret == Address::ZERO {
        return Ok(None);
    }
    Ok(Some(ret))
}

/// Decodes a factory `PairCreated` log. Pending logs, which have no
/// position yet, decode to `Ok(None)`.
pub fn decode_pair_created(log: &Log) -> Result<Option<PairCreatedEvent>> {
    let decoded = log
        .log_decode::<IUniswapV2Factory::PairCreated>()
        .map_err(|err| Error::rpc("PairCreated decode", err))?;
    let (Some(block_number), Some(log_index), Some(transaction_hash)) =
        (log.block_number, log.log_index, log.transaction_hash)
    else {
        return Ok(None);
    };
    let event = decoded.inner.data;
    Ok(Some(PairCreatedEvent {
        token0: event.token0,
        token1: event.token1,
        pair: event.pair,
        position: LogPosition {
            block_number,
            log_index,
            transaction_hash,
        },
    }))
}
