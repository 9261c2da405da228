//! LeaseWatch: apartment floor-plan scraping, normalization and reporting.

pub mod config;
pub mod error;
pub mod models;
pub mod parsing;
pub mod pipeline;
pub mod report;
pub mod scrapers;
pub mod server;
pub mod storage;

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber; `RUST_LOG` overrides the default `info` level
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}
