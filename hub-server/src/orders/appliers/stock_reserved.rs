//! StockReserved event applier

use crate::orders::traits::EventApplier;
use shared::order::{
    EventPayload, OrderSnapshot, ReservationState, ReservationStatus, TrackingEvent,
};

/// StockReserved applier
pub struct StockReservedApplier;

impl EventApplier for StockReservedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::StockReserved { hub_id } = &event.payload {
            snapshot.record(event);
            snapshot.reservation = ReservationState {
                status: ReservationStatus::Reserved,
                hub_id: Some(*hub_id),
                shortfalls: Vec::new(),
            };
        }
    }
}
