use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider};
use snipe_core::error::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out nonces for one account in strictly increasing order, even when
/// the node's pending count lags behind what was already issued.
pub struct NonceManager {
    next: AtomicU64,
}

impl NonceManager {
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    /// Syncs with the node's pending nonce and reserves the next one.
    pub async fn reserve(&self, provider: &DynProvider, address: Address) -> Result<u64> {
        let pending = provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|err| Error::rpc("PendingNonceAt", err))?;
        self.next.fetch_max(pending, Ordering::SeqCst);
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }

    /// Gives back a nonce that was never broadcast. Only the most recent
    /// reservation can be returned; anything older would leave a gap.
    pub fn release(&self, nonce: u64) -> bool {
        self.next
            .compare_exchange(
                nonce.saturating_add(1),
                nonce,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}
