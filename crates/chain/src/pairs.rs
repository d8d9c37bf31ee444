use crate::logs::{FeedEvent, LogFeed};
use alloy::primitives::Address;
use alloy::providers::DynProvider;
use alloy::rpc::types::Filter;
use alloy::sol_types::SolEvent;
use snipe_core::dedupe::DedupeCache;
use snipe_core::error::{Error, Result};
use snipe_core::types::{LogPosition, PairCreatedEvent};
use snipe_core::utils::now_ms;
use snipe_dex::abi::IUniswapV2Factory;
use snipe_dex::decode_pair_created;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const DEFAULT_DEDUP_CAPACITY: usize = 4_096;
const DEFAULT_DEDUP_TTL_MS: u64 = 600_000;

/// Ordered feed of pair creations. Ends with one `Err` when the underlying
/// subscription dies; callers re-subscribe if they want to keep watching.
pub type PairFeed = mpsc::UnboundedReceiver<Result<PairCreatedEvent>>;

pub struct PairSubscription {
    task: JoinHandle<()>,
}

impl PairSubscription {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub async fn watch_pair_created(
    provider: &DynProvider,
    factory: Address,
) -> Result<(PairSubscription, PairFeed)> {
    let dedupe = DedupeCache::new(DEFAULT_DEDUP_CAPACITY, DEFAULT_DEDUP_TTL_MS);
    watch_pair_created_with(provider, factory, dedupe).await
}

pub async fn watch_pair_created_with(
    provider: &DynProvider,
    factory: Address,
    dedupe: DedupeCache<LogPosition>,
) -> Result<(PairSubscription, PairFeed)> {
    let filter = Filter::new()
        .address(factory)
        .event_signature(IUniswapV2Factory::PairCreated::SIGNATURE_HASH);
    let feed = LogFeed::subscribe(provider, filter).await?;
    info!(%factory, "watching PairCreated");
    Ok(spawn_pair_pump(feed, dedupe))
}

fn spawn_pair_pump(
    mut feed: LogFeed,
    mut dedupe: DedupeCache<LogPosition>,
) -> (PairSubscription, PairFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        loop {
            let log = match feed.next_event().await {
                FeedEvent::Log(log) => log,
                FeedEvent::Closed(reason) => {
                    warn!(%reason, "PairCreated subscription ended");
                    let _ = tx.send(Err(Error::SubscriptionClosed(reason)));
                    return;
                }
            };
            if log.removed {
                debug!(tx = ?log.transaction_hash, "skipping removed PairCreated log");
                continue;
            }
            let event = match decode_pair_created(&log) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(err) => {
                    warn!(?err, tx = ?log.transaction_hash, "undecodable PairCreated log");
                    continue;
                }
            };
            if !dedupe.first_seen(event.position, now_ms()) {
                debug!(pair = %event.pair, "duplicate PairCreated log");
                continue;
            }
            if tx.send(Ok(event)).is_err() {
                debug!("pair feed receiver dropped");
                return;
            }
        }
    });
    (PairSubscription { task }, rx)
}
