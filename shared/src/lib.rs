//! Shared types for the hub network
//!
//! Domain types used by the hub server and its clients: hubs and zones,
//! per-hub inventory records, orders with their tracking timeline, and
//! the unified error/response types.

pub mod error;
pub mod hub;
pub mod inventory;
pub mod order;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use hub::{Hub, HubId, HubTier, Zone};
pub use inventory::{InventoryRecord, ProductId};
