//! OutForDelivery event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderSnapshot, ReservationStatus, TrackingEvent};

/// OutForDelivery applier
pub struct OutForDeliveryApplier;

impl EventApplier for OutForDeliveryApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::OutForDelivery { stock_fulfilled } = &event.payload {
            snapshot.record(event);
            if *stock_fulfilled {
                snapshot.reservation.status = ReservationStatus::Fulfilled;
            }
        }
    }
}
