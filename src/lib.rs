pub mod auth;
pub mod catalog;
pub mod config;
pub mod designs;
pub mod metrics;
pub mod orders;
pub mod rest;
pub mod seed;
pub mod storage;
pub mod validate;

use std::sync::Arc;

use catalog::CatalogStorage;
use config::StoreConfig;
use designs::DesignStorage;
use metrics::SharedMetrics;
use orders::OrderStorage;
use storage::Storage;

/// Shared application state passed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<StoreConfig>,
    pub storage: Arc<Storage>,
    /// Products, sizes, colors, images, inventory.
    pub catalog: Arc<CatalogStorage>,
    /// Orders and the placement/cancellation transactions.
    pub orders: Arc<OrderStorage>,
    /// Saved AI design records.
    pub designs: Arc<DesignStorage>,
    /// In-process Prometheus-style counters.
    pub metrics: SharedMetrics,
    /// Outbound HTTP client (Google OAuth). Built once, cloned per use.
    pub http: reqwest::Client,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Wire the context from resolved config + opened storage.
    pub fn new(config: StoreConfig, storage: Storage) -> anyhow::Result<Self> {
        let pool = storage.pool();
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            catalog: Arc::new(CatalogStorage::new(pool.clone())),
            orders: Arc::new(OrderStorage::new(pool.clone())),
            designs: Arc::new(DesignStorage::new(pool)),
            metrics: Arc::new(metrics::StoreMetrics::new()),
            http,
            started_at: std::time::Instant::now(),
        })
    }
}
