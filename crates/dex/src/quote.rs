use crate::abi::IUniswapV2Router02;
use alloy::primitives::{Address, TxKind, U256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::transaction::TransactionInput;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use snipe_core::error::{Error, Result};
use snipe_core::types::Quote;

pub const BPS_DENOMINATOR: u32 = 10_000;

/// Asks the router what `amount_in` buys along `path` right now.
pub async fn get_amounts_out(
    provider: &DynProvider,
    router: Address,
    from: Address,
    amount_in: U256,
    path: Vec<Address>,
) -> Result<Quote> {
    let call = IUniswapV2Router02::getAmountsOutCall {
        amountIn: amount_in,
        path: path.clone(),
    };
    let tx = TransactionRequest {
        from: Some(from),
        to: Some(TxKind::Call(router)),
        input: TransactionInput::new(call.abi_encode().into()),
        ..Default::default()
    };
    let data = provider
        .call(tx)
        .await
        .map_err(|err| Error::QuoteFailed(format!("getAmountsOut: {err}")))?;
    let amounts = IUniswapV2Router02::getAmountsOutCall::abi_decode_returns(&data)
        .map_err(|err| Error::QuoteFailed(format!("getAmountsOut decode: {err}")))?;

    if amounts.len() != path.len() {
        return Err(Error::QuoteFailed(format!(
            "router returned {} amounts for a path of {}",
            amounts.len(),
            path.len()
        )));
    }
    let quote = Quote { path, amounts };
    match quote.amount_out() {
        Some(out) if !out.is_zero() => Ok(quote),
        _ => Err(Error::QuoteFailed("no output for path".to_string())),
    }
}

/// Lowest output accepted for `quote` when tolerating `max_slippage_bps`
/// of adverse movement. 5000 bps is exactly half, truncated.
pub fn min_amount_out(quote: &Quote, max_slippage_bps: u32) -> Result<U256> {
    let out = quote
        .amount_out()
        .ok_or_else(|| Error::QuoteFailed("empty quote".to_string()))?;
    let keep = U256::from(BPS_DENOMINATOR - max_slippage_bps.min(BPS_DENOMINATOR));
    let denominator = U256::from(BPS_DENOMINATOR);
    Ok(match out.checked_mul(keep) {
        Some(scaled) => scaled / denominator,
        None => out / denominator * keep + out % denominator * keep / denominator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Bytes};
    use alloy::providers::ProviderBuilder;
    use alloy::transports::mock::Asserter;

    const WBNB: Address = address!("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");
    const TOKEN: Address = address!("0x00000000000000000000000000000000000000bb");
    const ROUTER: Address = address!("0x10ED43C718714eb63d5aA57B78B54704E256024E");

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    fn quote(amounts: Vec<U256>) -> Quote {
        Quote {
            path: vec![WBNB, TOKEN],
            amounts,
        }
    }

    fn mocked(asserter: &Asserter) -> DynProvider {
        ProviderBuilder::new()
            .connect_mocked_client(asserter.clone())
            .erased()
    }

    #[test]
    fn default_policy_accepts_half_of_quote() {
        let q = quote(vec![ether(1), ether(500)]);
        assert_eq!(min_amount_out(&q, 5_000).unwrap(), ether(250));
    }

    #[test]
    fn half_truncates_odd_amounts() {
        for last in [0u64, 1, 7, 999, 1_000_001] {
            let q = quote(vec![ether(1), U256::from(last)]);
            assert_eq!(min_amount_out(&q, 5_000).unwrap(), U256::from(last / 2));
        }
        let q = quote(vec![ether(1), U256::MAX]);
        assert_eq!(min_amount_out(&q, 5_000).unwrap(), U256::MAX / U256::from(2u64));
    }

    #[test]
    fn huge_quotes_round_down_exactly() {
        let q = quote(vec![ether(1), U256::MAX]);
        let three_quarters = U256::MAX - U256::MAX / U256::from(4u64) - U256::from(1u64);
        assert_eq!(min_amount_out(&q, 2_500).unwrap(), three_quarters);
        assert_eq!(
            min_amount_out(&q, 9_999).unwrap(),
            U256::MAX / U256::from(10_000u64)
        );
    }

    #[test]
    fn only_last_amount_matters_for_longer_paths() {
        let q = Quote {
            path: vec![WBNB, ROUTER, TOKEN],
            amounts: vec![ether(1), ether(3), U256::from(11u64)],
        };
        assert_eq!(min_amount_out(&q, 5_000).unwrap(), U256::from(5u64));
    }

    #[test]
    fn slippage_bounds_are_clamped() {
        let q = quote(vec![ether(1), ether(10)]);
        assert_eq!(min_amount_out(&q, 0).unwrap(), ether(10));
        assert_eq!(min_amount_out(&q, 20_000).unwrap(), U256::ZERO);
        assert!(min_amount_out(&quote(Vec::new()), 5_000).is_err());
    }

    #[tokio::test]
    async fn quote_decodes_router_amounts() {
        let asserter = Asserter::new();
        let encoded =
            IUniswapV2Router02::getAmountsOutCall::abi_encode_returns(&vec![ether(1), ether(500)]);
        asserter.push_success(&Bytes::from(encoded));

        let provider = mocked(&asserter);
        let q = get_amounts_out(&provider, ROUTER, Address::ZERO, ether(1), vec![WBNB, TOKEN])
            .await
            .unwrap();
        assert_eq!(q.path, vec![WBNB, TOKEN]);
        assert_eq!(q.amount_out(), Some(ether(500)));
        assert!(asserter.read_q().is_empty());
    }

    #[tokio::test]
    async fn quote_failure_is_fatal() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("execution reverted: PancakeLibrary: INSUFFICIENT_LIQUIDITY");

        let provider = mocked(&asserter);
        let err = get_amounts_out(&provider, ROUTER, Address::ZERO, ether(1), vec![WBNB, TOKEN])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QuoteFailed(_)));
        assert!(err.to_string().contains("INSUFFICIENT_LIQUIDITY"));
    }

    #[tokio::test]
    async fn zero_output_quote_is_rejected() {
        let asserter = Asserter::new();
        let encoded =
            IUniswapV2Router02::getAmountsOutCall::abi_encode_returns(&vec![ether(1), U256::ZERO]);
        asserter.push_success(&Bytes::from(encoded));

        let provider = mocked(&asserter);
        let err = get_amounts_out(&provider, ROUTER, Address::ZERO, ether(1), vec![WBNB, TOKEN])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QuoteFailed(_)));
    }
}
