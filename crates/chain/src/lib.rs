pub mod client;
pub mod logs;
pub mod pairs;

pub use client::{parse_signer, Identity, NodeClient};
pub use logs::{FeedEvent, LogFeed};
pub use pairs::{watch_pair_created, watch_pair_created_with, PairFeed, PairSubscription};
