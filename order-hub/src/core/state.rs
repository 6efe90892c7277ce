use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::core::{Config, Result};
use crate::orders::{OrderStorage, OrdersManager};
use crate::realtime::TopicBroadcaster;
use crate::services::{CatalogSeed, InMemoryCatalog, InMemoryInventory};

/// Server state - shared handles to every service
///
/// Cloning is cheap: every field is reference counted.
///
/// | Field | Description |
/// |-------|-------------|
/// | config | Configuration (immutable) |
/// | orders | Order manager (event log, projection, broadcast) |
/// | broadcaster | Realtime topic registry used by WebSocket handlers |
/// | catalog | Restaurants, tables, menus |
/// | inventory | Tracked stock counters |
/// | shutdown | Cancelled on shutdown; long-lived tasks watch it |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub orders: Arc<OrdersManager>,
    pub broadcaster: TopicBroadcaster,
    pub catalog: Arc<InMemoryCatalog>,
    pub inventory: Arc<InMemoryInventory>,
    pub shutdown: CancellationToken,
    pub started_at: Instant,
}

impl ServerState {
    /// Wire services around an opened storage
    pub fn new(config: Config, storage: OrderStorage, seed: &CatalogSeed) -> Self {
        let broadcaster = TopicBroadcaster::new(config.broadcast_capacity);
        let catalog = Arc::new(InMemoryCatalog::from_seed(seed));
        let inventory = Arc::new(InMemoryInventory::from_levels(&seed.stock));
        let orders = Arc::new(OrdersManager::new(
            storage,
            catalog.clone(),
            inventory.clone(),
            Arc::new(broadcaster.clone()),
        ));
        Self {
            config,
            orders,
            broadcaster,
            catalog,
            inventory,
            shutdown: CancellationToken::new(),
            started_at: Instant::now(),
        }
    }

    /// Initialize server state
    ///
    /// 1. Create the work directory
    /// 2. Open the order database
    /// 3. Load the catalog seed, if configured
    pub fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;

        let db_path = config.db_path();
        let storage = OrderStorage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Order database opened");

        let seed = match &config.catalog_file {
            Some(path) => CatalogSeed::load(path)?,
            None => {
                tracing::warn!("CATALOG_FILE not set, starting with an empty catalog");
                CatalogSeed::default()
            }
        };

        Ok(Self::new(config.clone(), storage, &seed))
    }

    /// State over an in-memory database (tests, demos)
    pub fn in_memory(config: Config, seed: &CatalogSeed) -> Result<Self> {
        let storage = OrderStorage::open_in_memory()?;
        Ok(Self::new(config, storage, seed))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
