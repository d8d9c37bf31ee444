use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::{Filter, Log};
use futures_util::StreamExt;
use snipe_core::error::{Error, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug)]
pub enum FeedEvent {
    Log(Log),
    Closed(String),
}

/// A live log subscription split into two inputs: delivered logs and the
/// subscription's terminal error. `next_event` merges them.
pub struct LogFeed {
    logs: mpsc::UnboundedReceiver<Log>,
    errors: Option<oneshot::Receiver<String>>,
    closed: Option<String>,
    task: Option<JoinHandle<()>>,
}

impl LogFeed {
    pub async fn subscribe(provider: &DynProvider, filter: Filter) -> Result<Self> {
        let sub = provider
            .subscribe_logs(&filter)
            .await
            .map_err(|err| Error::rpc("SubscribeFilterLogs", err))?;
        let (log_tx, logs) = mpsc::unbounded_channel();
        let (err_tx, errors) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut stream = sub.into_stream();
            while let Some(log) = stream.next().await {
                if log_tx.send(log).is_err() {
                    debug!("log feed receiver dropped");
                    return;
                }
            }
            let _ = err_tx.send("log subscription ended".to_string());
        });

        let mut feed = Self::from_channels(logs, errors);
        feed.task = Some(task);
        Ok(feed)
    }

    pub fn from_channels(
        logs: mpsc::UnboundedReceiver<Log>,
        errors: oneshot::Receiver<String>,
    ) -> Self {
        Self {
            logs,
            errors: Some(errors),
            closed: None,
            task: None,
        }
    }

    /// Next log, or the reason the feed closed. A terminal error wins over
    /// logs still in flight, but logs already buffered when it fired are
    /// handed out before `Closed`. Once closed it stays closed.
    pub async fn next_event(&mut self) -> FeedEvent {
        if self.closed.is_none() {
            let reason = match self.errors.as_mut() {
                Some(errors) => tokio::select! {
                    biased;
                    reason = errors => {
                        reason.unwrap_or_else(|_| "log subscription dropped".to_string())
                    }
                    log = self.logs.recv() => match log {
                        Some(log) => return FeedEvent::Log(log),
                        None => "log stream ended".to_string(),
                    },
                },
                None => "log feed closed".to_string(),
            };
            self.errors = None;
            self.logs.close();
            self.closed = Some(reason);
        }

        match self.logs.try_recv() {
            Ok(log) => FeedEvent::Log(log),
            Err(_) => FeedEvent::Closed(self.closed.clone().unwrap_or_default()),
        }
    }
}

impl Drop for LogFeed {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;

    fn log_for(hash: u8) -> Log {
        Log {
            transaction_hash: Some(B256::from([hash; 32])),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn delivers_logs_in_order() {
        let (log_tx, logs) = mpsc::unbounded_channel();
        let (_err_tx, errors) = oneshot::channel();
        let mut feed = LogFeed::from_channels(logs, errors);

        for hash in 1..=3u8 {
            log_tx.send(log_for(hash)).unwrap();
        }
        for hash in 1..=3u8 {
            match feed.next_event().await {
                FeedEvent::Log(log) => {
                    assert_eq!(log.transaction_hash, Some(B256::from([hash; 32])))
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn buffered_logs_drain_before_close() {
        let (log_tx, logs) = mpsc::unbounded_channel();
        let (err_tx, errors) = oneshot::channel();
        let mut feed = LogFeed::from_channels(logs, errors);

        log_tx.send(log_for(1)).unwrap();
        log_tx.send(log_for(2)).unwrap();
        err_tx.send("websocket closed".to_string()).unwrap();

        for hash in 1..=2u8 {
            match feed.next_event().await {
                FeedEvent::Log(log) => {
                    assert_eq!(log.transaction_hash, Some(B256::from([hash; 32])))
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        match feed.next_event().await {
            FeedEvent::Closed(reason) => assert_eq!(reason, "websocket closed"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(feed.next_event().await, FeedEvent::Closed(_)));
    }

    #[tokio::test]
    async fn logs_after_close_are_refused() {
        let (log_tx, logs) = mpsc::unbounded_channel();
        let (err_tx, errors) = oneshot::channel();
        let mut feed = LogFeed::from_channels(logs, errors);

        err_tx.send("websocket closed".to_string()).unwrap();
        assert!(matches!(feed.next_event().await, FeedEvent::Closed(_)));
        assert!(log_tx.send(log_for(1)).is_err());
        match feed.next_event().await {
            FeedEvent::Closed(reason) => assert_eq!(reason, "websocket closed"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropped_error_sender_closes_feed() {
        let (_log_tx, logs) = mpsc::unbounded_channel::<Log>();
        let (err_tx, errors) = oneshot::channel::<String>();
        let mut feed = LogFeed::from_channels(logs, errors);
        drop(err_tx);

        assert!(matches!(feed.next_event().await, FeedEvent::Closed(_)));
    }
}
