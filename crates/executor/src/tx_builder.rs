use crate::fees::{FeeStrategy, GasPrice};
use alloy::primitives::{Address, TxKind, U256};
use alloy::rpc::types::transaction::TransactionInput;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use snipe_dex::abi::IUniswapV2Router02;

#[derive(Debug, Clone)]
pub struct BuyEthParams {
    pub path: Vec<Address>,
    pub amount_in: U256,
    pub min_amount_out: U256,
    pub recipient: Address,
    pub deadline: U256,
}

#[derive(Clone)]
pub struct SwapTxBuilder {
    pub router: Address,
    pub owner: Address,
    pub chain_id: u64,
    pub fees: FeeStrategy,
}

impl SwapTxBuilder {
    pub fn new(router: Address, owner: Address, chain_id: u64, fees: FeeStrategy) -> Self {
        Self {
            router,
            owner,
            chain_id,
            fees,
        }
    }

    /// Native-currency buy through the fee-on-transfer tolerant router entry
    /// point. The budget travels as the transaction value.
    pub fn build_buy_eth(
        &self,
        params: BuyEthParams,
        nonce: u64,
        gas_price: GasPrice,
    ) -> TransactionRequest {
        let amount_in = params.amount_in;
        let mut tx = TransactionRequest {
            from: Some(self.owner),
            to: Some(TxKind::Call(self.router)),
            input: TransactionInput::new(Self::encode_buy_eth(params).into()),
            value: Some(amount_in),
            nonce: Some(nonce),
            chain_id: Some(self.chain_id),
            ..Default::default()
        };
        self.fees.apply(&mut tx, gas_price);
        tx
    }

    pub fn encode_buy_eth(params: BuyEthParams) -> Vec<u8> {
        let call = IUniswapV2Router02::swapExactETHForTokensSupportingFeeOnTransferTokensCall {
            amountOutMin: params.min_amount_out,
            path: params.path,
            to: params.recipient,
            deadline: params.deadline,
        };
        call.abi_encode()
    }
}
