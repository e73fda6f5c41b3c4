//! Order lifecycle for the hub network
//!
//! - **manager**: OrdersManager, command processing and hub administration
//! - **actions**: one command handler per lifecycle operation
//! - **appliers**: fold tracking events into order snapshots
//! - **storage**: redb persistence for snapshots, indexes and codes
//! - **collection**: hub collection code generation and hashing
//!
//! # Architecture
//!
//! ```text
//! Command → OrdersManager → TrackingEvent → Storage (redb)
//!                 ↓                ↓
//!             Inventory      Snapshot Update (status re-derived)
//!                 ↓
//!     Broadcast / Restock / Notify / Refund
//! ```
//!
//! # Data Flow
//!
//! 1. A hub operator or customer request reaches the API
//! 2. OrdersManager validates the command against the snapshot and route
//! 3. Tracking events are generated with a global sequence
//! 4. Stock is reserved, released or consumed in the same transaction
//! 5. Snapshots are updated and their status derived from the timeline
//! 6. Events are broadcast, collaborators are called after commit
//! 7. The updated snapshot is returned

pub mod actions;
pub mod appliers;
pub mod collection;
pub mod manager;
pub mod storage;
pub mod traits;

// Re-exports
pub use manager::{
    DecommissionReport, ManagerError, ManagerResult, OrdersManager, PlacementResult,
    RestockResult, StatusDrift,
};
pub use storage::OrderStorage;
pub use traits::OrderError;

// Re-export shared types for convenience
pub use shared::order::{
    EventPayload, OrderSnapshot, OrderStatus, TrackingEvent, TrackingEventType,
};
