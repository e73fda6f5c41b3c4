//! StockShortfall event applier

use crate::orders::traits::EventApplier;
use shared::order::{
    EventPayload, OrderSnapshot, ReservationState, ReservationStatus, TrackingEvent,
};

/// StockShortfall applier - order held until restock
pub struct StockShortfallApplier;

impl EventApplier for StockShortfallApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::StockShortfall { hub_id, shortfalls } = &event.payload {
            snapshot.record(event);
            snapshot.reservation = ReservationState {
                status: ReservationStatus::Held,
                hub_id: Some(*hub_id),
                shortfalls: shortfalls.clone(),
            };
        }
    }
}
