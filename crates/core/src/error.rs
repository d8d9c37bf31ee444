use std::time::Duration;

use alloy::primitives::B256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("chain id query failed: {0}")]
    ChainQueryFailed(String),
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),
    #[error("{op}: {message}")]
    Rpc { op: &'static str, message: String },
    #[error("quote failed: {0}")]
    QuoteFailed(String),
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    #[error("subscription closed: {0}")]
    SubscriptionClosed(String),
    #[error("settlement aborted for {hash}: {reason}")]
    SettlementAbort { hash: B256, reason: String },
    #[error("settlement of {hash} not observed within {waited:?}")]
    SettlementTimeout { hash: B256, waited: Duration },
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Wraps an RPC failure with the name of the call that produced it.
    pub fn rpc(op: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Rpc {
            op,
            message: err.to_string(),
        }
    }

    /// Short stable label, used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Connection(_) => "connection",
            Self::InvalidKey(_) => "invalid_key",
            Self::ChainQueryFailed(_) => "chain_query",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::Rpc { .. } => "rpc",
            Self::QuoteFailed(_) => "quote",
            Self::SubmissionFailed(_) => "submission",
            Self::SubscriptionClosed(_) => "subscription_closed",
            Self::SettlementAbort { .. } => "settlement_abort",
            Self::SettlementTimeout { .. } => "settlement_timeout",
            Self::Anyhow(_) => "other",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn rpc_error_names_the_operation() {
        let err = Error::rpc("PendingNonceAt", "connection reset");
        assert_eq!(err.to_string(), "PendingNonceAt: connection reset");
        assert_eq!(err.kind(), "rpc");
    }
}
