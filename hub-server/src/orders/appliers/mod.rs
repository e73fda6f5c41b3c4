//! Event applier implementations
//!
//! Each applier implements the `EventApplier` trait and handles
//! one specific event type. Appliers are PURE functions: they record the
//! event on the timeline and update the snapshot fields it touches. The
//! status itself is re-derived from the timeline by the manager.

use enum_dispatch::enum_dispatch;
use shared::order::{EventPayload, TrackingEvent};

mod hub_arrived;
mod hub_dispatched;
mod order_cancelled;
mod order_delivered;
mod order_placed;
mod out_for_delivery;
mod ready_for_collection;
mod refund_updated;
mod route_reassigned;
mod status_repaired;
mod stock_reserved;
mod stock_shortfall;

pub use hub_arrived::HubArrivedApplier;
pub use hub_dispatched::HubDispatchedApplier;
pub use order_cancelled::OrderCancelledApplier;
pub use order_delivered::OrderDeliveredApplier;
pub use order_placed::OrderPlacedApplier;
pub use out_for_delivery::OutForDeliveryApplier;
pub use ready_for_collection::ReadyForCollectionApplier;
pub use refund_updated::RefundUpdatedApplier;
pub use route_reassigned::RouteReassignedApplier;
pub use status_repaired::StatusRepairedApplier;
pub use stock_reserved::StockReservedApplier;
pub use stock_shortfall::StockShortfallApplier;

/// EventAction enum - dispatches to concrete applier implementations
///
/// Uses enum_dispatch for zero-cost static dispatch.
#[enum_dispatch(EventApplier)]
pub enum EventAction {
    OrderPlaced(OrderPlacedApplier),
    StockReserved(StockReservedApplier),
    StockShortfall(StockShortfallApplier),
    HubArrived(HubArrivedApplier),
    HubDispatched(HubDispatchedApplier),
    OutForDelivery(OutForDeliveryApplier),
    ReadyForCollection(ReadyForCollectionApplier),
    OrderDelivered(OrderDeliveredApplier),
    OrderCancelled(OrderCancelledApplier),
    StatusRepaired(StatusRepairedApplier),
    RouteReassigned(RouteReassignedApplier),
    RefundUpdated(RefundUpdatedApplier),
}

/// Convert TrackingEvent reference to EventAction
///
/// This is the ONLY place with a match on EventPayload.
impl From<&TrackingEvent> for EventAction {
    fn from(event: &TrackingEvent) -> Self {
        match &event.payload {
            EventPayload::OrderPlaced { .. } => EventAction::OrderPlaced(OrderPlacedApplier),
            EventPayload::StockReserved { .. } => EventAction::StockReserved(StockReservedApplier),
            EventPayload::StockShortfall { .. } => {
                EventAction::StockShortfall(StockShortfallApplier)
            }
            EventPayload::ArrivedAtHub { .. } => EventAction::HubArrived(HubArrivedApplier),
            EventPayload::Dispatched { .. } => EventAction::HubDispatched(HubDispatchedApplier),
            EventPayload::OutForDelivery { .. } => {
                EventAction::OutForDelivery(OutForDeliveryApplier)
            }
            EventPayload::ReadyForCollection { .. } => {
                EventAction::ReadyForCollection(ReadyForCollectionApplier)
            }
            EventPayload::Delivered { .. } => EventAction::OrderDelivered(OrderDeliveredApplier),
            EventPayload::Cancelled { .. } => EventAction::OrderCancelled(OrderCancelledApplier),
            EventPayload::StatusRepaired { .. } => {
                EventAction::StatusRepaired(StatusRepairedApplier)
            }
            EventPayload::RouteReassigned { .. } => {
                EventAction::RouteReassigned(RouteReassignedApplier)
            }
            EventPayload::RefundUpdated { .. } => EventAction::RefundUpdated(RefundUpdatedApplier),
        }
    }
}

/// Shared event builder for applier tests
#[cfg(test)]
pub(crate) fn test_event(
    seq: u64,
    event_type: shared::order::TrackingEventType,
    hub_id: Option<shared::hub::HubId>,
    payload: EventPayload,
) -> TrackingEvent {
    let mut event = TrackingEvent::new(seq, "order-1", event_type, hub_id, "", payload);
    event.timestamp = 1_700_000_000_000 + seq as i64;
    event
}
