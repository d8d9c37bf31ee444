use alloy::network::EthereumWallet;
use alloy::primitives::{Address, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use snipe_core::config::ChainConfig;
use snipe_core::error::{Error, Result};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// The caller's signing key, its address and the chain it signs for.
pub struct Identity {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl Identity {
    pub fn new(signer: PrivateKeySigner, chain_id: u64) -> Self {
        Self {
            signer: signer.with_chain_id(Some(chain_id)),
            chain_id,
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// Parses a hex private key (with or without `0x`). The key must be exactly
/// 32 bytes and a valid secp256k1 scalar.
pub fn parse_signer(raw: &str) -> Result<PrivateKeySigner> {
    let trimmed = raw.trim();
    let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let key = B256::from_str(body)
        .map_err(|_| Error::InvalidKey("expected 32 hex-encoded bytes".to_string()))?;
    PrivateKeySigner::from_bytes(&key).map_err(|err| Error::InvalidKey(err.to_string()))
}

/// Single long-lived RPC session plus the identity that signs over it.
pub struct NodeClient {
    pub provider: DynProvider,
    identity: Identity,
}

impl NodeClient {
    pub fn new(provider: DynProvider, identity: Identity) -> Self {
        Self { provider, identity }
    }

    /// Dials the node, validates the key and resolves the chain id, in that
    /// order. Nothing is retried.
    pub async fn connect(cfg: &ChainConfig, private_key: &str) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .connect(&cfg.rpc_ws)
            .await
            .map_err(|err| Error::Connection(err.to_string()))?
            .erased();
        let signer = parse_signer(private_key)?;
        let chain_id = resolve_chain_id(&provider, cfg.chain_id).await?;
        let identity = Identity::new(signer, chain_id);
        info!(address = %identity.address(), chain_id, "connected");
        Ok(Self::new(provider, identity))
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn address(&self) -> Address {
        self.identity.address()
    }

    /// Releases the session. Consuming `self` makes a second close
    /// impossible; a connect that failed part-way has already dropped what
    /// it acquired.
    pub fn close(self) {
        info!(address = %self.identity.address(), "connection closed");
        drop(self);
    }
}

async fn resolve_chain_id(provider: &DynProvider, expected: Option<u64>) -> Result<u64> {
    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|err| Error::ChainQueryFailed(err.to_string()))?;
    match expected {
        Some(expected) if expected != chain_id => Err(Error::ChainQueryFailed(format!(
            "node reports chain {chain_id}, config expects {expected}"
        ))),
        _ => Ok(chain_id),
    }
}
