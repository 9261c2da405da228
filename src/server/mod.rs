//! JSON façade over the stored snapshots.

pub mod error;
pub mod handlers;
pub mod routes;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use warp::Filter;

use crate::config::Config;
use crate::storage::JsonStore;

pub use routes::routes;

pub struct AppState {
    pub config: Config,
    pub store: JsonStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = JsonStore::new(&config.data_dir);
        Self { config, store }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    let addr = config.addr;
    let state = Arc::new(AppState::new(config));

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    let api = routes(state).with(cors).with(warp::trace::request());

    info!("🌐 LeaseWatch server listening on http://{}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
