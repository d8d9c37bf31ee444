use alloy::primitives::{Address, Bytes, B256, U256};

/// Where a log sits in the chain, used to order and deduplicate events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogPosition {
    pub block_number: u64,
    pub log_index: u64,
    pub transaction_hash: B256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairCreatedEvent {
    pub token0: Address,
    pub token1: Address,
    pub pair: Address,
    pub position: LogPosition,
}

impl PairCreatedEvent {
    pub fn involves(&self, token: Address) -> bool {
        self.token0 == token || self.token1 == token
    }

    /// The other side of the pair, if `token` is one of its members.
    pub fn counterpart(&self, token: Address) -> Option<Address> {
        if self.token0 == token {
            Some(self.token1)
        } else if self.token1 == token {
            Some(self.token0)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub path: Vec<Address>,
    pub amounts: Vec<U256>,
}

impl Quote {
    /// Expected output for the final path element.
    pub fn amount_out(&self) -> Option<U256> {
        self.amounts.last().copied()
    }
}

#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub hash: B256,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub value: U256,
    pub raw: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStatus {
    Succeeded,
    Reverted,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Reverted => "reverted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settlement {
    pub tx_hash: B256,
    pub status: SettlementStatus,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub logs_observed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn counterpart_resolves_either_side() {
        let weth = address!("0x00000000000000000000000000000000000000aa");
        let token = address!("0x00000000000000000000000000000000000000bb");
        let event = PairCreatedEvent {
            token0: weth,
            token1: token,
            pair: address!("0x00000000000000000000000000000000000000cc"),
            position: LogPosition {
                block_number: 1,
                log_index: 0,
                transaction_hash: B256::ZERO,
            },
        };

        assert!(event.involves(token));
        assert_eq!(event.counterpart(token), Some(weth));
        assert_eq!(event.counterpart(weth), Some(token));
        assert_eq!(event.counterpart(Address::ZERO), None);
    }
}
