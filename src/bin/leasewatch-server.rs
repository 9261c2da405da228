use anyhow::Context;
use leasewatch::config::Config;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    leasewatch::init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("🚀 Starting LeaseWatch server, data in {}", config.data_dir.display());

    leasewatch::server::serve(config).await
}
