//! ReadyForCollection event applier

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderSnapshot, ReservationStatus, TrackingEvent};

/// ReadyForCollection applier
pub struct ReadyForCollectionApplier;

impl EventApplier for ReadyForCollectionApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::ReadyForCollection { stock_fulfilled } = &event.payload {
            snapshot.record(event);
            if *stock_fulfilled {
                snapshot.reservation.status = ReservationStatus::Fulfilled;
            }
        }
    }
}
