//! Delivered event applier
//!
//! Cash on delivery is settled at handover.

use crate::orders::traits::EventApplier;
use shared::order::{
    EventPayload, OrderSnapshot, PaymentMethod, PaymentStatus, ReservationStatus, TrackingEvent,
};

/// OrderDelivered applier
pub struct OrderDeliveredApplier;

impl EventApplier for OrderDeliveredApplier {
    fn apply(&self, snapshot: &mut OrderSnapshot, event: &TrackingEvent) {
        if let EventPayload::Delivered {
            stock_fulfilled, ..
        } = &event.payload
        {
            snapshot.record(event);
            if *stock_fulfilled {
                snapshot.reservation.status = ReservationStatus::Fulfilled;
            }
            if snapshot.payment.method == PaymentMethod::Cod
                && snapshot.payment.status == PaymentStatus::Pending
            {
                snapshot.payment.status = PaymentStatus::Paid;
            }
        }
    }
}
