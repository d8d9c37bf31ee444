use crate::abi::IERC20;
use alloy::primitives::{Address, TxKind, U256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::transaction::TransactionInput;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use snipe_core::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHoldings {
    pub name: String,
    pub decimals: u8,
    pub balance: U256,
}

async fn call_token<C: SolCall>(
    provider: &DynProvider,
    token: Address,
    call: C,
    op: &'static str,
) -> Result<C::Return> {
    let tx = TransactionRequest {
        to: Some(TxKind::Call(token)),
        input: TransactionInput::new(call.abi_encode().into()),
        ..Default::default()
    };
    let data = provider.call(tx).await.map_err(|err| Error::rpc(op, err))?;
    C::abi_decode_returns(&data).map_err(|err| Error::rpc(op, err))
}

pub async fn token_name(provider: &DynProvider, token: Address) -> Result<String> {
    call_token(provider, token, IERC20::nameCall {}, "Name").await
}

pub async fn token_decimals(provider: &DynProvider, token: Address) -> Result<u8> {
    call_token(provider, token, IERC20::decimalsCall {}, "Decimals").await
}

pub async fn balance_of(provider: &DynProvider, token: Address, owner: Address) -> Result<U256> {
    call_token(
        provider,
        token,
        IERC20::balanceOfCall { account: owner },
        "BalanceOf",
    )
    .await
}

/// Name, decimals and `owner`'s balance, queried in that order.
pub async fn holdings(
    provider: &DynProvider,
    token: Address,
    owner: Address,
) -> Result<TokenHoldings> {
    let name = token_name(provider, token).await?;
    let decimals = token_decimals(provider, token).await?;
    let balance = balance_of(provider, token, owner).await?;
    Ok(TokenHoldings {
        name,
        decimals,
        balance,
    })
}
