//! OrderPlaced event applier
//!
//! Initializes the snapshot from the placement payload. The order starts
//! at its fulfilling hub.

use crate::orders::traits::EventApplier;
use shared::order::{EventPayload, OrderSnapshot, TrackingEvent};

/// OrderPlaced applier
pub struct OrderPlacedApplier;

impl EventApplier for OrderPlacedApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::OrderPlaced {
            order_number,
            items,
            total_amount,
            delivery_type,
            destination,
            route,
            fulfilling_hub_id,
            payment,
        } = &event.payload
        {
            snapshot.record(event);

            snapshot.order_number = order_number.clone();
            snapshot.items = items.clone();
            snapshot.total_amount = *total_amount;
            snapshot.delivery_type = *delivery_type;
            snapshot.destination = Some(destination.clone());
            snapshot.route = route.clone();
            snapshot.fulfilling_hub = Some(*fulfilling_hub_id);
            snapshot.current_hub = Some(*fulfilling_hub_id);
            snapshot.payment = payment.clone();
            snapshot.created_at = event.timestamp;
        }
    }
}
