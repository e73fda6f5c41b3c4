//! Per-hub inventory: ledger rows and order-level reservation

mod coordinator;
mod error;
mod ledger;

pub use coordinator::ReservationCoordinator;
pub use error::{InventoryError, InventoryResult};
pub use ledger::{IntegrityReport, InventoryLedger};
