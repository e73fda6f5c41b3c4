//! Dispatched (IN_TRANSIT) event applier
//!
//! The current hub stays where it is until the next hub scans the order
//! in; the dispatch is visible through the timeline.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderSnapshot, ReservationStatus, TrackingEvent};

/// HubDispatched applier
pub struct HubDispatchedApplier;

impl EventApplier for HubDispatchedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::Dispatched {
            stock_fulfilled, ..
        } = &event.payload
        {
            snapshot.record(event);
            if *stock_fulfilled {
                snapshot.reservation.status = ReservationStatus::Fulfilled;
            }
        }
    }
}
