//! Order types
//!
//! - Snapshots: current order state, route and full tracking timeline
//! - Events: append-only facts recorded by the hub server
//! - Timeline: the pure status derivation and dispatch rules

pub mod event;
pub mod snapshot;
pub mod timeline;
pub mod types;

// Re-exports
pub use event::{EventPayload, TrackingEvent, TrackingEventType};
pub use snapshot::{OrderSnapshot, OrderStatus};
pub use timeline::{derive_status, dispatched_from, implied_status, route_ahead, status_drift};
pub use types::*;
