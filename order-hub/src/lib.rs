//! Order Hub - live restaurant order engine
//!
//! # Overview
//!
//! Orders are event sourced: every change is an append to a per-order log
//! with a gapless sequence, projected into an aggregate in the same redb
//! transaction, then fanned out as full snapshots over WebSocket topics.
//!
//! # Module layout
//!
//! ```text
//! order-hub/src/
//! ├── core/          # Config, state, errors, server
//! ├── orders/        # Event log, commands, projector, tickets, snapshots
//! ├── order_money/   # Decimal totals and money validation
//! ├── realtime/      # Topic broadcaster
//! ├── services/      # Catalog and inventory
//! ├── api/           # HTTP and WebSocket routes
//! └── utils/         # Logging, HTTP error mapping
//! ```

pub mod api;
pub mod core;
pub mod order_money;
pub mod orders;
pub mod realtime;
pub mod services;
pub mod utils;

pub use core::{Config, Server, ServerState};
pub use orders::{OrderStorage, OrdersManager};
pub use realtime::TopicBroadcaster;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialize logging from the environment
///
/// Returns the loaded configuration so the caller does not read it twice.
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    config
}
