//! OrdersManager - command processing for the order lifecycle
//!
//! This module handles:
//! - Command validation and processing
//! - Event generation with global sequence numbers
//! - Reservation changes in the same redb transaction as the order
//! - Status re-derivation after every applied event
//! - Event broadcasting and post-commit side effects
//!
//! # Command Flow
//!
//! ```text
//! execute(command_id, action)
//!     ├─ 1. Idempotency check (command_id)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Create CommandContext (topology snapshot, inventory)
//!     ├─ 4. Execute action → tracking events + side effects
//!     ├─ 5. Apply events via EventApplier, re-derive status
//!     ├─ 6. Persist snapshots, sequence, processed command
//!     ├─ 7. Commit transaction
//!     ├─ 8. Broadcast event(s)
//!     ├─ 9. Run side effects (restock, notify, refund)
//!     └─ 10. Return snapshot
//! ```
//!
//! A rejected command aborts the transaction: no events, no inventory
//! change, no effects.

mod error;
pub use error::*;

use std::sync::Arc;

use chrono::Utc;
use redb::Database;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::hub::{Hub, HubId};
use shared::inventory::{InventoryRecord, ProductId, RestockSource};
use shared::order::timeline::dispatch_event;
use shared::order::{
    LineItem, OrderSnapshot, OrderStatus, Payment, PlaceOrderInput, RefundStatus,
    ReservationOutcome, ReservationStatus, TrackingEvent, derive_status, dispatched_from,
    route_ahead, status_drift,
};
use tokio::sync::broadcast;

use super::actions::{
    CancelOrderAction, CommandAction, ConfirmDeliveryAction, DispatchFromHubAction,
    PlaceOrderAction, PrepareCollectionAction, ReassignRouteAction, RecordRefundAction,
    RepairStatusAction, RetryReservationAction, ScanAtHubAction, VerifyCollectionAction,
};
use super::appliers::EventAction;
use super::collection::{generate_code, hash_code};
use super::storage::OrderStorage;
use super::traits::{
    CommandContext, CommandHandler, CommandMetadata, EventApplier, OrderError, SideEffect,
};
use crate::inventory::{InventoryLedger, ReservationCoordinator};
use crate::services::{Collaborators, RefundOutcome};
use crate::topology::{TopologyError, TopologyService};

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 65536;

/// Result of placing an order
#[derive(Debug, Clone, Serialize)]
pub struct PlacementResult {
    pub order: OrderSnapshot,
    pub reservation: ReservationOutcome,
}

impl From<OrderSnapshot> for PlacementResult {
    fn from(order: OrderSnapshot) -> Self {
        let reservation = match order.reservation.status {
            ReservationStatus::Held => ReservationOutcome::PendingStock {
                shortfalls: order.reservation.shortfalls.clone(),
            },
            _ => ReservationOutcome::Reserved,
        };
        Self { order, reservation }
    }
}

/// Restock result: the updated row and the orders it unblocked
#[derive(Debug, Clone, Serialize)]
pub struct RestockResult {
    pub record: InventoryRecord,
    pub approved_orders: Vec<OrderSnapshot>,
}

/// Stored status disagreeing with the timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusDrift {
    pub order_id: String,
    pub order_number: String,
    pub stored: OrderStatus,
    pub derived: OrderStatus,
}

/// Hub decommission summary
#[derive(Debug, Clone, Serialize)]
pub struct DecommissionReport {
    pub retired: Hub,
    pub replacement: Hub,
    pub rerouted_orders: Vec<String>,
}

/// Committed command: the target snapshot plus what was recorded
struct Processed {
    order: OrderSnapshot,
    effects: Vec<SideEffect>,
}

/// OrdersManager for command processing
///
/// The `epoch` field is a unique identifier generated on each startup.
/// Clients use it to detect server restarts and resync.
pub struct OrdersManager {
    storage: OrderStorage,
    coordinator: ReservationCoordinator,
    topology: Arc<TopologyService>,
    collaborators: Collaborators,
    event_tx: broadcast::Sender<TrackingEvent>,
    epoch: String,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<OrderStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl OrdersManager {
    /// Create the manager on a shared database
    pub fn new(
        db: Arc<Database>,
        topology: Arc<TopologyService>,
        collaborators: Collaborators,
    ) -> ManagerResult<Self> {
        let storage = OrderStorage::open(db.clone())?;
        let coordinator = ReservationCoordinator::new(InventoryLedger::new(db)?);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let epoch = uuid::Uuid::new_v4().to_string();
        tracing::info!(epoch = %epoch, "OrdersManager started with new epoch");
        Ok(Self {
            storage,
            coordinator,
            topology,
            collaborators,
            event_tx,
            epoch,
        })
    }

    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackingEvent> {
        self.event_tx.subscribe()
    }

    pub fn topology(&self) -> &Arc<TopologyService> {
        &self.topology
    }

    pub fn ledger(&self) -> &InventoryLedger {
        self.coordinator.ledger()
    }

    /// Next order number, HN{yyyymmdd}{10000+n} (crash-safe via redb)
    fn next_order_number(&self) -> ManagerResult<String> {
        let count = self.storage.next_order_count()?;
        let date_str = Utc::now().format("%Y%m%d").to_string();
        Ok(format!("HN{}{}", date_str, 10000 + count))
    }

    // ========== Command processing ==========

    /// Execute a command and return the resulting snapshot
    pub fn execute(
        &self,
        command_id: Option<String>,
        action: CommandAction,
    ) -> ManagerResult<OrderSnapshot> {
        let order_id = action.order_id().to_string();
        let processed = self.process(command_id, action)?;
        if self.run_effects(processed.effects) {
            // 退款结果已作为新事件记录
            return self.get_order(&order_id);
        }
        Ok(processed.order)
    }

    fn process(
        &self,
        command_id: Option<String>,
        action: CommandAction,
    ) -> ManagerResult<Processed> {
        let command_name = action.name();

        // 1. Idempotency check (before transaction)
        if let Some(cmd) = command_id.as_deref()
            && let Some(order_id) = self.storage.processed_command(cmd)?
        {
            tracing::info!(command_id = cmd, %order_id, "Duplicate command, returning current state");
            return Ok(Processed {
                order: self.get_order(&order_id)?,
                effects: Vec::new(),
            });
        }

        // 2. Begin write transaction
        let txn = self.storage.begin_write()?;

        // Double-check idempotency within transaction
        if let Some(cmd) = command_id.as_deref()
            && let Some(order_id) = self.storage.processed_command_txn(&txn, cmd)?
        {
            drop(txn);
            return Ok(Processed {
                order: self.get_order(&order_id)?,
                effects: Vec::new(),
            });
        }

        // 3. Create context
        let current_sequence = self.storage.current_sequence_txn(&txn)?;
        let mut ctx = CommandContext::new(
            &txn,
            &self.storage,
            &self.coordinator,
            self.topology.graph(),
            current_sequence,
        );
        let metadata = CommandMetadata::new(command_id.clone());

        // 4. Execute action
        let events = action.execute(&mut ctx, &metadata).map_err(|e| {
            tracing::debug!(command = command_name, error = %e, "Command rejected");
            ManagerError::from(e)
        })?;

        // 5. Apply events to snapshots
        for event in &events {
            let mut snapshot = snapshot_for_event(&ctx, &event.order_id)?;
            let applier: EventAction = event.into();
            applier.apply(&mut snapshot, event);
            snapshot.status = derive_status(&snapshot.route, &snapshot.timeline);
            ctx.save_snapshot(snapshot);
        }
        let last_sequence = ctx.current_sequence();
        let (snapshots, effects) = ctx.finish();

        // 6. Persist
        for snapshot in &snapshots {
            self.storage.store_snapshot(&txn, snapshot)?;
        }
        if last_sequence > current_sequence {
            self.storage.set_sequence(&txn, last_sequence)?;
        }
        let order_id = action.order_id();
        if let Some(cmd) = command_id.as_deref() {
            self.storage.mark_command_processed(&txn, cmd, order_id)?;
        }

        // 7. Commit
        txn.commit().map_err(crate::db::StorageError::from)?;

        tracing::info!(
            command = command_name,
            command_id = command_id.as_deref().unwrap_or(""),
            order_id,
            event_count = events.len(),
            "Command processed successfully"
        );

        // 8. Broadcast
        for event in events {
            if self.event_tx.send(event).is_err() {
                tracing::trace!("Event broadcast skipped: no active receivers");
            }
        }

        let order = match snapshots.into_iter().find(|s| s.order_id == order_id) {
            Some(order) => order,
            None => self.get_order(order_id)?,
        };
        Ok(Processed { order, effects })
    }

    /// Run post-commit effects. Failures are logged only.
    /// Returns true when a refund outcome was recorded.
    fn run_effects(&self, effects: Vec<SideEffect>) -> bool {
        let mut refunded = false;
        for effect in effects {
            match effect {
                SideEffect::RaiseRestock(requests) => {
                    for request in requests {
                        let (hub_id, product_id) = (request.hub_id, request.product_id);
                        if let Err(e) = self.collaborators.restock.raise_restock_request(request) {
                            tracing::error!(hub_id, product_id, error = %e, "Restock request failed");
                        }
                    }
                }
                SideEffect::NotifyHub {
                    hub_id,
                    order_id,
                    notice,
                } => {
                    if let Err(e) =
                        self.collaborators
                            .notifier
                            .notify_hub_managers(hub_id, &order_id, notice)
                    {
                        tracing::warn!(hub_id, %order_id, error = %e, "Hub notification failed");
                    }
                }
                SideEffect::Refund {
                    order_id,
                    transaction_id,
                    amount,
                    reason,
                } => {
                    self.refund(&order_id, transaction_id.as_deref(), amount, &reason);
                    refunded = true;
                }
            }
        }
        refunded
    }

    /// Call the refund processor and record its outcome on the timeline
    fn refund(&self, order_id: &str, transaction_id: Option<&str>, amount: Decimal, reason: &str) {
        let outcome = match self.collaborators.refunds.refund(
            transaction_id.unwrap_or_default(),
            amount,
            reason,
        ) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(order_id, error = %e, "Refund processor call failed");
                RefundOutcome::failed(e.to_string())
            }
        };
        if !outcome.success {
            tracing::warn!(order_id, error_code = ?outcome.error_code, "Refund failed");
        }

        let action = CommandAction::RecordRefund(RecordRefundAction {
            order_id: order_id.to_string(),
            amount,
            outcome,
        });
        if let Err(e) = self.process(None, action) {
            tracing::error!(order_id, error = %e, "Failed to record refund outcome");
        }
    }

    // ========== Order lifecycle ==========

    /// Place an order. Stock shortfall is not an error: the order is held.
    pub fn place_order(&self, input: PlaceOrderInput) -> ManagerResult<PlacementResult> {
        if let Some(cmd) = input.command_id.as_deref()
            && let Some(order_id) = self.storage.processed_command(cmd)?
        {
            return Ok(self.get_order(&order_id)?.into());
        }

        let items = input
            .items
            .into_iter()
            .map(|item| LineItem {
                product_id: item.product_id,
                name: item.name,
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .collect();
        let payment = Payment {
            transaction_id: input.payment.transaction_id,
            ..Payment::new(input.payment.method, input.payment.status)
        };

        let action = CommandAction::PlaceOrder(PlaceOrderAction {
            order_id: uuid::Uuid::new_v4().to_string(),
            order_number: self.next_order_number()?,
            items,
            delivery_type: input.delivery_type,
            shipping_address: input.shipping_address,
            collection_hub_id: input.collection_hub_id,
            payment,
        });
        let order = self.execute(input.command_id, action)?;
        Ok(order.into())
    }

    pub fn scan_at_hub(
        &self,
        command_id: Option<String>,
        order_id: &str,
        hub_id: HubId,
    ) -> ManagerResult<OrderSnapshot> {
        self.topology.hub(hub_id)?;
        self.execute(
            command_id,
            CommandAction::ScanAtHub(ScanAtHubAction {
                order_id: order_id.to_string(),
                hub_id,
            }),
        )
    }

    pub fn dispatch_from_hub(
        &self,
        command_id: Option<String>,
        order_id: &str,
        hub_id: HubId,
    ) -> ManagerResult<OrderSnapshot> {
        self.topology.hub(hub_id)?;
        self.execute(
            command_id,
            CommandAction::DispatchFromHub(DispatchFromHubAction {
                order_id: order_id.to_string(),
                hub_id,
            }),
        )
    }

    pub fn confirm_delivery(
        &self,
        command_id: Option<String>,
        order_id: &str,
    ) -> ManagerResult<OrderSnapshot> {
        self.execute(
            command_id,
            CommandAction::ConfirmDelivery(ConfirmDeliveryAction {
                order_id: order_id.to_string(),
            }),
        )
    }

    pub fn cancel_order(
        &self,
        command_id: Option<String>,
        order_id: &str,
        reason: Option<String>,
    ) -> ManagerResult<OrderSnapshot> {
        self.execute(
            command_id,
            CommandAction::CancelOrder(CancelOrderAction {
                order_id: order_id.to_string(),
                reason,
            }),
        )
    }

    /// Issue a collection code. The plain code is returned once and only
    /// its digest is stored; issuing again replaces the previous code.
    pub fn generate_collection_code(&self, order_id: &str) -> ManagerResult<(String, OrderSnapshot)> {
        let code = generate_code();
        let order = self.execute(
            None,
            CommandAction::PrepareCollection(PrepareCollectionAction {
                order_id: order_id.to_string(),
                code_digest: hash_code(order_id, &code),
            }),
        )?;
        Ok((code, order))
    }

    pub fn verify_collection(&self, order_id: &str, code: &str) -> ManagerResult<OrderSnapshot> {
        let result = self.execute(
            None,
            CommandAction::VerifyCollection(VerifyCollectionAction {
                order_id: order_id.to_string(),
                code: code.to_string(),
            }),
        );
        if let Err(ManagerError::Rejected(OrderError::InvalidCollectionCode(_))) = &result {
            tracing::warn!(order_id, "Collection code mismatch");
        }
        result
    }

    /// Retry a refund that previously failed
    pub fn retry_refund(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        let order = self.get_order(order_id)?;
        if order.payment.refund_status == Some(RefundStatus::Processed) {
            return Err(ManagerError::Rejected(OrderError::AlreadyRefunded(
                order_id.to_string(),
            )));
        }
        if order.payment.refund_status != Some(RefundStatus::Failed) {
            return Err(ManagerError::Rejected(OrderError::InvalidOperation(format!(
                "order {order_id} has no failed refund"
            ))));
        }
        let amount = order.payment.refund_amount.unwrap_or(order.total_amount);
        self.refund(
            order_id,
            order.payment.transaction_id.as_deref(),
            amount,
            "Refund retry",
        );
        self.get_order(order_id)
    }

    // ========== Queries ==========

    pub fn get_order(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        self.storage
            .get_snapshot(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    pub fn get_active_orders(&self) -> ManagerResult<Vec<OrderSnapshot>> {
        Ok(self.storage.get_active_orders()?)
    }

    /// Orders a hub must act on: in transit towards it, waiting for stock
    /// or waiting for dispatch. Orders already dispatched from the hub are
    /// never listed.
    pub fn active_orders_at_hub(&self, hub_id: HubId) -> ManagerResult<Vec<OrderSnapshot>> {
        self.topology.hub(hub_id)?;
        let mut orders: Vec<OrderSnapshot> = self
            .storage
            .get_orders_awaiting(hub_id)?
            .into_iter()
            .filter(|o| {
                !o.is_terminal()
                    && o.status != OrderStatus::OutForDelivery
                    && !dispatched_from(o, hub_id)
            })
            .collect();
        orders.sort_by(|a, b| {
            view_rank(a.status)
                .cmp(&view_rank(b.status))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(orders)
    }

    /// Orders that left the hub, most recent dispatch first
    pub fn dispatched_orders_from_hub(&self, hub_id: HubId) -> ManagerResult<Vec<OrderSnapshot>> {
        self.topology.hub(hub_id)?;
        let mut orders: Vec<(i64, OrderSnapshot)> = self
            .storage
            .get_all_snapshots()?
            .into_iter()
            .filter_map(|o| {
                let at = dispatch_event(&o.timeline, hub_id)?.timestamp;
                Some((at, o))
            })
            .collect();
        orders.sort_by(|(a, _), (b, _)| b.cmp(a));
        Ok(orders.into_iter().map(|(_, o)| o).collect())
    }

    // ========== Inventory ==========

    /// Restock a hub, then retry orders held there (oldest first)
    pub fn restock(
        &self,
        hub_id: HubId,
        product_id: ProductId,
        amount: i64,
        source: RestockSource,
        note: Option<String>,
    ) -> ManagerResult<RestockResult> {
        self.topology.hub(hub_id)?;
        let record = self
            .coordinator
            .ledger()
            .restock(hub_id, product_id, amount, source, note)?;
        let approved_orders = self.retry_held_orders(hub_id)?;
        Ok(RestockResult {
            record,
            approved_orders,
        })
    }

    /// Retry every order held at `hub_id`, FIFO by creation time
    pub fn retry_held_orders(&self, hub_id: HubId) -> ManagerResult<Vec<OrderSnapshot>> {
        let mut held: Vec<OrderSnapshot> = self
            .storage
            .get_active_orders()?
            .into_iter()
            .filter(|o| {
                o.reservation.status == ReservationStatus::Held
                    && o.reservation.hub_id == Some(hub_id)
            })
            .collect();
        held.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.order_number.cmp(&b.order_number))
        });

        let mut approved = Vec::new();
        for order in held {
            let action = CommandAction::RetryReservation(RetryReservationAction {
                order_id: order.order_id.clone(),
            });
            match self.execute(None, action) {
                Ok(updated) if updated.reservation.status == ReservationStatus::Reserved => {
                    approved.push(updated);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(order_id = %order.order_id, error = %e, "Reservation retry failed");
                }
            }
        }
        if !approved.is_empty() {
            tracing::info!(hub_id, approved = approved.len(), "Held orders approved after restock");
        }
        Ok(approved)
    }

    // ========== Status repair ==========

    pub fn find_status_drift(&self) -> ManagerResult<Vec<StatusDrift>> {
        Ok(self
            .storage
            .get_all_snapshots()?
            .into_iter()
            .filter_map(|o| {
                let (stored, derived) = status_drift(&o)?;
                Some(StatusDrift {
                    order_id: o.order_id,
                    order_number: o.order_number,
                    stored,
                    derived,
                })
            })
            .collect())
    }

    pub fn repair_status(&self, order_id: &str) -> ManagerResult<OrderSnapshot> {
        self.execute(
            None,
            CommandAction::RepairStatus(RepairStatusAction {
                order_id: order_id.to_string(),
            }),
        )
    }

    /// Repair every drifted order, returning the repaired snapshots
    pub fn repair_all_status(&self) -> ManagerResult<Vec<OrderSnapshot>> {
        self.find_status_drift()?
            .into_iter()
            .map(|drift| self.repair_status(&drift.order_id))
            .collect()
    }

    // ========== Hub administration ==========

    /// Open orders that have yet to leave `hub_id`
    pub fn open_orders_referencing(&self, hub_id: HubId) -> ManagerResult<Vec<OrderSnapshot>> {
        Ok(self
            .storage
            .get_active_orders()?
            .into_iter()
            .filter(|o| route_ahead(o).contains(&hub_id))
            .collect())
    }

    /// Deactivation is refused while open orders still route through the hub
    pub fn set_hub_active(&self, hub_id: HubId, active: bool) -> ManagerResult<Hub> {
        if !active {
            let open = self.open_orders_referencing(hub_id)?;
            if !open.is_empty() {
                return Err(TopologyError::HubInUse {
                    hub_id,
                    open_orders: open.len(),
                }
                .into());
            }
        }
        Ok(self.topology.set_hub_active(hub_id, active)?)
    }

    /// Move the remaining route of every open order from one hub to another
    pub fn reassign_hub(&self, from_hub_id: HubId, to_hub_id: HubId) -> ManagerResult<Vec<OrderSnapshot>> {
        self.topology.hub(from_hub_id)?;
        self.topology.hub(to_hub_id)?;

        let mut rerouted = Vec::new();
        for order in self.open_orders_referencing(from_hub_id)? {
            let action = CommandAction::ReassignRoute(ReassignRouteAction {
                order_id: order.order_id.clone(),
                from_hub_id,
                to_hub_id,
            });
            rerouted.push(self.execute(None, action)?);
        }
        tracing::info!(from_hub_id, to_hub_id, orders = rerouted.len(), "Hub reassigned");
        Ok(rerouted)
    }

    /// Retire a hub: reroute its open orders, then deactivate it.
    ///
    /// A replacement in the same district takes over the district; any
    /// other replacement must already be active.
    pub fn decommission_hub(
        &self,
        hub_id: HubId,
        replacement_id: HubId,
    ) -> ManagerResult<DecommissionReport> {
        if hub_id == replacement_id {
            return Err(ManagerError::Rejected(OrderError::InvalidOperation(
                "a hub cannot replace itself".to_string(),
            )));
        }
        let retired = self.topology.hub(hub_id)?;
        let replacement = self.topology.hub(replacement_id)?;
        let same_district = retired.serves(&replacement.district);

        // 先校验拓扑变更，再改动订单
        if same_district {
            self.topology.check_retirement(hub_id, Some(replacement_id))?;
        } else {
            if !replacement.active {
                return Err(TopologyError::HubInactive(replacement_id).into());
            }
            self.topology.check_retirement(hub_id, None)?;
        }

        // 货物在该枢纽或占用其库存的订单无法改道
        let pinned = self
            .open_orders_referencing(hub_id)?
            .iter()
            .filter(|o| is_pinned_to(o, hub_id))
            .count();
        if pinned > 0 {
            return Err(TopologyError::HubInUse {
                hub_id,
                open_orders: pinned,
            }
            .into());
        }

        let rerouted_orders = self
            .reassign_hub(hub_id, replacement_id)?
            .into_iter()
            .map(|o| o.order_id)
            .collect();

        let (retired, replacement) = if same_district {
            self.topology.replace_hub(hub_id, replacement_id)?
        } else {
            (self.set_hub_active(hub_id, false)?, replacement)
        };
        tracing::warn!(hub_id, replacement_id, "Hub decommissioned");

        Ok(DecommissionReport {
            retired,
            replacement,
            rerouted_orders,
        })
    }
}

/// Goods at the hub, or stock reserved or held there
fn is_pinned_to(order: &OrderSnapshot, hub_id: HubId) -> bool {
    order.current_hub == Some(hub_id)
        || (order.reservation.hub_id == Some(hub_id)
            && matches!(
                order.reservation.status,
                ReservationStatus::Reserved | ReservationStatus::Held
            ))
}

/// Hub view ordering: incoming first, then waiting for stock, then ready
fn view_rank(status: OrderStatus) -> u8 {
    match status {
        OrderStatus::InTransit => 0,
        OrderStatus::Pending => 1,
        OrderStatus::Approved => 2,
        _ => 3,
    }
}

/// Snapshot an event folds into. Only a missing order starts a fresh one,
/// any other load error aborts the command.
fn snapshot_for_event(ctx: &CommandContext<'_>, order_id: &str) -> Result<OrderSnapshot, OrderError> {
    match ctx.load_snapshot(order_id) {
        Err(OrderError::OrderNotFound(_)) => Ok(OrderSnapshot::new(order_id.to_string())),
        other => other,
    }
}

#[cfg(test)]
mod tests;
