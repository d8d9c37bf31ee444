pub mod config;
pub mod dedupe;
pub mod error;
pub mod metrics;
pub mod types;
pub mod units;
pub mod utils;

pub use config::AppConfig;
pub use error::{Error, Result};
