//! Command and event traits for the order pipeline
//!
//! - [`CommandHandler`]: validates against the current snapshot and emits events
//! - [`EventApplier`]: folds one event into a snapshot (pure)
//! - [`CommandContext`]: transaction-scoped view shared by the handlers

use std::collections::HashMap;
use std::sync::Arc;

use enum_dispatch::enum_dispatch;
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::hub::HubId;
use shared::order::{OrderSnapshot, OrderStatus, TrackingEvent, TrackingEventType};
use thiserror::Error;

// enum_dispatch 在此处展开 EventAction 的 impl，需要 applier 类型在作用域内
use super::appliers::*;
use super::storage::OrderStorage;
use crate::db::StorageError;
use crate::inventory::{InventoryError, ReservationCoordinator};
use crate::services::{HubNotice, RestockRequest};
use crate::topology::{HubGraph, TopologyError};

/// Command metadata
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    /// 幂等键（可选）
    pub command_id: Option<String>,
    pub timestamp: i64,
}

impl CommandMetadata {
    pub fn new(command_id: Option<String>) -> Self {
        Self {
            command_id,
            timestamp: shared::util::now_millis(),
        }
    }
}

/// Collaborator calls queued by a command, run after commit
#[derive(Debug, Clone)]
pub enum SideEffect {
    RaiseRestock(Vec<RestockRequest>),
    NotifyHub {
        hub_id: HubId,
        order_id: String,
        notice: HubNotice,
    },
    Refund {
        order_id: String,
        transaction_id: Option<String>,
        amount: Decimal,
        reason: String,
    },
}

/// Order command errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Hub not found: {0}")]
    HubNotFound(HubId),

    #[error("Order {order_id}: {from} -> {to} is not allowed")]
    InvalidStateTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
        conflicting_event: Option<String>,
    },

    #[error("Order {order_id} already dispatched from hub {hub_id} ({event_type}, seq {sequence})")]
    AlreadyDispatched {
        order_id: String,
        hub_id: HubId,
        event_type: TrackingEventType,
        sequence: u64,
    },

    #[error("Order {order_id} already scanned in at hub {hub_id} (seq {sequence})")]
    AlreadyScanned {
        order_id: String,
        hub_id: HubId,
        sequence: u64,
    },

    #[error("Hub {hub_id} is not on the route of order {order_id}")]
    HubNotOnRoute { order_id: String, hub_id: HubId },

    #[error("Order {order_id} is not at hub {hub_id} (current hub: {current_hub:?})")]
    OrderNotAtHub {
        order_id: String,
        hub_id: HubId,
        current_hub: Option<HubId>,
    },

    #[error("Order already cancelled: {0}")]
    AlreadyCancelled(String),

    #[error("Order already delivered: {0}")]
    AlreadyDelivered(String),

    #[error("Refund for order {0} already processed")]
    AlreadyRefunded(String),

    #[error("Invalid collection code for order {0}")]
    InvalidCollectionCode(String),

    #[error("Order {order_id} is not available for collection ({status})")]
    CollectionNotAvailable {
        order_id: String,
        status: OrderStatus,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Transaction-scoped context handed to command handlers
pub struct CommandContext<'a> {
    txn: &'a WriteTransaction,
    storage: &'a OrderStorage,
    coordinator: &'a ReservationCoordinator,
    graph: Arc<HubGraph>,
    sequence: u64,
    snapshots: HashMap<String, OrderSnapshot>,
    effects: Vec<SideEffect>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        txn: &'a WriteTransaction,
        storage: &'a OrderStorage,
        coordinator: &'a ReservationCoordinator,
        graph: Arc<HubGraph>,
        current_sequence: u64,
    ) -> Self {
        Self {
            txn,
            storage,
            coordinator,
            graph,
            sequence: current_sequence,
            snapshots: HashMap::new(),
            effects: Vec::new(),
        }
    }

    pub fn txn(&self) -> &'a WriteTransaction {
        self.txn
    }

    pub fn storage(&self) -> &'a OrderStorage {
        self.storage
    }

    pub fn coordinator(&self) -> &'a ReservationCoordinator {
        self.coordinator
    }

    /// Topology snapshot taken when the command started
    pub fn graph(&self) -> &HubGraph {
        &self.graph
    }

    /// Hub name for event locations
    pub fn hub_name(&self, hub_id: HubId) -> Option<String> {
        self.graph.hub(hub_id).map(|hub| hub.name.clone())
    }

    /// Allocate the next global sequence number
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Load a snapshot, preferring the copy modified in this command
    pub fn load_snapshot(&self, order_id: &str) -> Result<OrderSnapshot, OrderError> {
        if let Some(snapshot) = self.snapshots.get(order_id) {
            return Ok(snapshot.clone());
        }
        self.storage
            .get_snapshot_txn(self.txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    pub fn save_snapshot(&mut self, snapshot: OrderSnapshot) {
        self.snapshots.insert(snapshot.order_id.clone(), snapshot);
    }

    pub fn push_effect(&mut self, effect: SideEffect) {
        self.effects.push(effect);
    }

    /// Consume the context: modified snapshots and queued side effects
    pub fn finish(self) -> (Vec<OrderSnapshot>, Vec<SideEffect>) {
        (self.snapshots.into_values().collect(), self.effects)
    }
}

/// Command handler: validation plus event generation
pub trait CommandHandler {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError>;
}

/// Event applier: pure snapshot update
#[enum_dispatch]
pub trait EventApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent);
}
