//! Shared types for the live order hub
//!
//! Common types used by the server and its clients: order events, the order
//! aggregate, station tickets, catalog models, the realtime state snapshot
//! and the unified error codes.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
