//! Command action implementations
//!
//! Each action implements the `CommandHandler` trait and handles
//! one specific command type.

use crate::orders::traits::{CommandContext, CommandHandler, CommandMetadata, OrderError};
use shared::hub::HubId;
use shared::order::{
    EventPayload, OrderSnapshot, OrderStatus, ReservationOutcome, ReservationStatus,
    TrackingEvent, TrackingEventType,
};

mod cancel_order;
mod confirm_delivery;
mod dispatch_from_hub;
mod place_order;
mod prepare_collection;
mod reassign_route;
mod record_refund;
mod repair_status;
mod retry_reservation;
mod scan_at_hub;
mod verify_collection;

pub use cancel_order::CancelOrderAction;
pub use confirm_delivery::ConfirmDeliveryAction;
pub use dispatch_from_hub::DispatchFromHubAction;
pub use place_order::PlaceOrderAction;
pub use prepare_collection::PrepareCollectionAction;
pub use reassign_route::ReassignRouteAction;
pub(crate) use reassign_route::reassigned_destination;
pub use record_refund::RecordRefundAction;
pub use repair_status::RepairStatusAction;
pub use retry_reservation::RetryReservationAction;
pub use scan_at_hub::ScanAtHubAction;
pub use verify_collection::VerifyCollectionAction;

/// CommandAction enum - dispatches to concrete action implementations
#[derive(Debug, Clone)]
pub enum CommandAction {
    PlaceOrder(PlaceOrderAction),
    ScanAtHub(ScanAtHubAction),
    DispatchFromHub(DispatchFromHubAction),
    ConfirmDelivery(ConfirmDeliveryAction),
    CancelOrder(CancelOrderAction),
    PrepareCollection(PrepareCollectionAction),
    VerifyCollection(VerifyCollectionAction),
    RetryReservation(RetryReservationAction),
    RepairStatus(RepairStatusAction),
    ReassignRoute(ReassignRouteAction),
    RecordRefund(RecordRefundAction),
}

impl CommandAction {
    /// Order the command targets
    pub fn order_id(&self) -> &str {
        match self {
            CommandAction::PlaceOrder(a) => &a.order_id,
            CommandAction::ScanAtHub(a) => &a.order_id,
            CommandAction::DispatchFromHub(a) => &a.order_id,
            CommandAction::ConfirmDelivery(a) => &a.order_id,
            CommandAction::CancelOrder(a) => &a.order_id,
            CommandAction::PrepareCollection(a) => &a.order_id,
            CommandAction::VerifyCollection(a) => &a.order_id,
            CommandAction::RetryReservation(a) => &a.order_id,
            CommandAction::RepairStatus(a) => &a.order_id,
            CommandAction::ReassignRoute(a) => &a.order_id,
            CommandAction::RecordRefund(a) => &a.order_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandAction::PlaceOrder(_) => "PlaceOrder",
            CommandAction::ScanAtHub(_) => "ScanAtHub",
            CommandAction::DispatchFromHub(_) => "DispatchFromHub",
            CommandAction::ConfirmDelivery(_) => "ConfirmDelivery",
            CommandAction::CancelOrder(_) => "CancelOrder",
            CommandAction::PrepareCollection(_) => "PrepareCollection",
            CommandAction::VerifyCollection(_) => "VerifyCollection",
            CommandAction::RetryReservation(_) => "RetryReservation",
            CommandAction::RepairStatus(_) => "RepairStatus",
            CommandAction::ReassignRoute(_) => "ReassignRoute",
            CommandAction::RecordRefund(_) => "RecordRefund",
        }
    }
}

/// Manual implementation of CommandHandler for CommandAction
impl CommandHandler for CommandAction {
    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Vec<TrackingEvent>, OrderError> {
        match self {
            CommandAction::PlaceOrder(action) => action.execute(ctx, metadata),
            CommandAction::ScanAtHub(action) => action.execute(ctx, metadata),
            CommandAction::DispatchFromHub(action) => action.execute(ctx, metadata),
            CommandAction::ConfirmDelivery(action) => action.execute(ctx, metadata),
            CommandAction::CancelOrder(action) => action.execute(ctx, metadata),
            CommandAction::PrepareCollection(action) => action.execute(ctx, metadata),
            CommandAction::VerifyCollection(action) => action.execute(ctx, metadata),
            CommandAction::RetryReservation(action) => action.execute(ctx, metadata),
            CommandAction::RepairStatus(action) => action.execute(ctx, metadata),
            CommandAction::ReassignRoute(action) => action.execute(ctx, metadata),
            CommandAction::RecordRefund(action) => action.execute(ctx, metadata),
        }
    }
}

// ========== Shared guards ==========

/// Terminal orders accept no further lifecycle commands
pub(crate) fn ensure_open(order: &OrderSnapshot) -> Result<(), OrderError> {
    match order.status {
        OrderStatus::Cancelled => Err(OrderError::AlreadyCancelled(order.order_id.clone())),
        OrderStatus::Delivered => Err(OrderError::AlreadyDelivered(order.order_id.clone())),
        _ => Ok(()),
    }
}

/// Check `from -> to` against the transition table (same status is a no-op)
pub(crate) fn ensure_transition(
    order: &OrderSnapshot,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<(), OrderError> {
    ensure_open(order)?;
    if from == to || from.can_transition_to(to) {
        return Ok(());
    }
    Err(OrderError::InvalidStateTransition {
        order_id: order.order_id.clone(),
        from,
        to,
        conflicting_event: order
            .timeline
            .iter()
            .rev()
            .find(|e| e.event_type.is_status_bearing())
            .map(TrackingEvent::describe_ref),
    })
}

/// Build an event with the next sequence, the command id and the hub name
pub(crate) fn new_event(
    ctx: &mut CommandContext<'_>,
    metadata: &CommandMetadata,
    order_id: &str,
    event_type: TrackingEventType,
    hub_id: Option<HubId>,
    description: impl Into<String>,
    payload: EventPayload,
) -> TrackingEvent {
    let seq = ctx.next_sequence();
    let mut event = TrackingEvent::new(seq, order_id, event_type, hub_id, description, payload)
        .with_command_id(metadata.command_id.clone());
    event.timestamp = metadata.timestamp;
    if let Some(name) = hub_id.and_then(|id| ctx.hub_name(id)) {
        event = event.at_location(name);
    }
    event
}

/// Goods leave `hub_id`: consume the reservation if it is held there
pub(crate) fn fulfill_if_reserved_at(
    ctx: &CommandContext<'_>,
    order: &OrderSnapshot,
    hub_id: HubId,
) -> Result<bool, OrderError> {
    if order.reservation.status != ReservationStatus::Reserved
        || order.reservation.hub_id != Some(hub_id)
    {
        return Ok(false);
    }
    ctx.coordinator()
        .fulfill_order_txn(ctx.txn(), hub_id, &order.items)?;
    Ok(true)
}

/// Retry a held reservation. `Some(APPROVED)` once every line is
/// reserved; `None` while still short (nothing is recorded).
pub(crate) fn retry_held_reservation(
    ctx: &mut CommandContext<'_>,
    metadata: &CommandMetadata,
    order: &OrderSnapshot,
    hub_id: HubId,
) -> Result<Option<TrackingEvent>, OrderError> {
    let outcome = ctx
        .coordinator()
        .reserve_order_txn(ctx.txn(), hub_id, &order.items)?;
    match outcome {
        ReservationOutcome::Reserved => {
            let event = new_event(
                ctx,
                metadata,
                &order.order_id,
                TrackingEventType::Approved,
                Some(hub_id),
                "Stock reserved after restock",
                EventPayload::StockReserved { hub_id },
            );
            Ok(Some(event))
        }
        ReservationOutcome::PendingStock { shortfalls } => {
            tracing::debug!(order_id = %order.order_id, hub_id, ?shortfalls, "Order still short");
            Ok(None)
        }
    }
}
