use anyhow::Result;
use prometheus::{IntCounter, IntCounterVec};
use snipe_core::metrics::Metrics;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

pub struct SnipeMetrics {
    metrics: Metrics,
    pub pairs_observed: IntCounter,
    pub buys_submitted: IntCounter,
    pub settlements_total: IntCounterVec,
    pub failures_total: IntCounterVec,
}

impl SnipeMetrics {
    pub fn new() -> Result<Self> {
        let metrics = Metrics::new();
        let pairs_observed = metrics.counter(
            "pairs_observed_total",
            "PairCreated events delivered by the factory watch",
        )?;
        let buys_submitted =
            metrics.counter("buys_submitted_total", "Swap transactions broadcast")?;
        let settlements_total = metrics.counter_vec(
            "settlements_total",
            "Settled buys by receipt status",
            &["status"],
        )?;
        let failures_total = metrics.counter_vec(
            "failures_total",
            "Failed operations by error kind",
            &["kind"],
        )?;

        Ok(Self {
            metrics,
            pairs_observed,
            buys_submitted,
            settlements_total,
            failures_total,
        })
    }

    pub fn gather(&self) -> String {
        self.metrics.gather()
    }
}

/// Serves the text exposition on `bind` from a background thread and
/// returns the bound address.
pub fn spawn_metrics_server(bind: &str, metrics: Arc<SnipeMetrics>) -> Result<SocketAddr> {
    let listener = TcpListener::bind(bind)?;
    let local = listener.local_addr()?;
    thread::spawn(move || {
        info!(bind = %local, "metrics server listening");
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = handle_connection(stream, &metrics) {
                        warn!(?err, "metrics server connection failed");
                    }
                }
                Err(err) => {
                    warn!(?err, "metrics server accept failed");
                }
            }
        }
    });
    Ok(local)
}

fn handle_connection(stream: TcpStream, metrics: &SnipeMetrics) -> Result<()> {
    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut header = String::new();
    while reader.read_line(&mut header)? > 2 {
        header.clear();
    }
    let mut parts = request_line.split_whitespace();
    let response = match (parts.next(), parts.next()) {
        (Some("GET"), Some("/metrics")) => {
            let body = metrics.gather();
            format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
        }
        _ => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
    };
    (&stream).write_all(response.as_bytes())?;
    Ok(())
}
