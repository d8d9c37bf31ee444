pub mod metrics;
pub mod orchestrator;

pub use metrics::{spawn_metrics_server, SnipeMetrics};
pub use orchestrator::Sniper;
